use chrono::{Duration, NaiveDate, TimeZone, Utc};
use quiz_core::model::{
    Mode, QuestionId, QuestionResult, SessionId, SessionResult, StageId, UserProgress,
};
use quiz_core::scheduler::ReviewScheduler;
use storage::repository::{KeyValueStore, ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteStore;
use storage::{PROGRESS_KEY, ProgressStore};

fn committed_progress() -> UserProgress {
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();
    let results = vec![
        QuestionResult {
            question_id: QuestionId::new("basics-1"),
            selected_choice_index: 0,
            correct_choice_index: 0,
            is_correct: true,
            time_spent_ms: 4_000,
            selected_choice_id: None,
        },
        QuestionResult {
            question_id: QuestionId::new("basics-2"),
            selected_choice_index: 1,
            correct_choice_index: 2,
            is_correct: false,
            time_spent_ms: 9_000,
            selected_choice_id: None,
        },
    ];
    let session = SessionResult::new(
        SessionId::new("session-1"),
        Mode::Stage(StageId::Basics),
        now,
        results,
        13_000,
    )
    .unwrap();
    let start = UserProgress::new(now.date_naive() - Duration::days(2));
    ReviewScheduler::new().commit(&start, session, now).unwrap()
}

#[tokio::test]
async fn sqlite_kv_upserts_and_removes() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    // migrations are idempotent
    store.migrate().await.expect("migrate again");

    assert_eq!(store.get("missing").await.unwrap(), None);

    store.put("k", "first").await.unwrap();
    store.put("k", "second").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_progress_round_trip() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("storage");
    assert!(storage.progress.load_progress().await.unwrap().is_none());

    let progress = committed_progress();
    storage.progress.save_progress(&progress).await.unwrap();

    let loaded = storage
        .progress
        .load_progress()
        .await
        .unwrap()
        .expect("snapshot");
    assert_eq!(loaded, progress);
    assert_eq!(loaded.streak, 1);
    assert_eq!(
        loaded.last_study_date,
        NaiveDate::from_ymd_opt(2024, 6, 3)
    );
    let missed = loaded.stat(&QuestionId::new("basics-2")).unwrap();
    assert_eq!(missed.srs_level.value(), 0);
    assert!(missed.next_review_date.is_none());
}

#[tokio::test]
async fn sqlite_corrupt_snapshot_reports_serialization_error() {
    let storage = Storage::sqlite("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.put(PROGRESS_KEY, "[1, 2").await.unwrap();

    assert!(matches!(
        storage.progress.load_progress().await,
        Err(StorageError::Serialization(_))
    ));
}

#[tokio::test]
async fn private_memory_database_keeps_state_across_calls() {
    let store = SqliteStore::connect("sqlite::memory:").await.expect("connect");
    store.migrate().await.expect("migrate");
    let kv: std::sync::Arc<dyn KeyValueStore> = std::sync::Arc::new(store);
    let progress = ProgressStore::with_key(kv, "alt_key");

    let snapshot = committed_progress();
    progress.save_progress(&snapshot).await.unwrap();
    assert_eq!(progress.key(), "alt_key");
    assert_eq!(progress.load_progress().await.unwrap(), Some(snapshot));
}
