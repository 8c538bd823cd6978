use chrono::Duration;
use quiz_core::QuestionBank;
use quiz_core::model::{Mode, QuestionId, StageId};
use quiz_core::time::fixed_now;
use services::{Clock, QuizServices, SessionError, SessionLoopService};
use storage::repository::Storage;

const BANK: &str = r#"[
    {"id": "b1", "stageId": "basics", "difficulty": 1, "body": "What does CIA stand for?",
     "choices": [{"id": "a", "text": "Confidentiality, integrity, availability"},
                 {"id": "b", "text": "Control, identity, access"},
                 {"id": "c", "text": "Central intelligence agency"}],
     "correctChoiceId": "a", "explanation": "The classic triad.", "tags": ["cia"]},
    {"id": "b2", "stageId": "basics", "difficulty": 2, "body": "Which is a threat?",
     "choices": [{"id": "a", "text": "Patch"}, {"id": "b", "text": "Malware"}],
     "correctChoiceId": "b", "tags": ["threats"]},
    {"id": "l1", "stageId": "legal", "difficulty": 3, "body": "Which law covers personal data?",
     "choices": [{"id": "a", "text": "Data protection law"}, {"id": "b", "text": "Traffic law"}],
     "correctChoiceId": "a", "tags": ["law"]}
]"#;

fn bank() -> QuestionBank {
    QuestionBank::from_json(BANK).unwrap()
}

async fn answer_all(loop_svc: &SessionLoopService, mode: Mode, correct: bool) -> services::SessionOutcome {
    let mut session = loop_svc.start_session(mode, 10).await.unwrap();
    while let Some(question) = session.current_question() {
        let right = question.correct_index();
        let pick = if correct { right } else { (right + 1) % question.choices.len() };
        loop_svc.answer_current(&mut session, pick).unwrap();
    }
    loop_svc.finish(&mut session).await.unwrap()
}

#[tokio::test]
async fn stage_session_commits_and_persists() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), bank());
    let loop_svc = services.session_loop().clone().with_seed(42);

    let outcome = answer_all(&loop_svc, Mode::Stage(StageId::Basics), true).await;

    assert_eq!(outcome.result.score(), 1000);
    assert_eq!(outcome.report.correct, 2);
    assert!(outcome.report.missed.is_empty());
    assert_eq!(outcome.progress.streak, 1);

    let stored = services.progress().load().await.unwrap();
    assert_eq!(stored, outcome.progress);
    let stat = stored.stat(&QuestionId::new("b1")).unwrap();
    assert_eq!(stat.srs_level.value(), 1);
    assert!(stored.stat(&QuestionId::new("l1")).is_none());
}

#[tokio::test]
async fn review_without_history_is_empty() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), bank());
    let result = services.session_loop().start_session(Mode::Review, 10).await;
    assert!(matches!(result, Err(SessionError::Empty)));
}

#[tokio::test]
async fn review_session_picks_up_misses_and_records_basics() {
    let storage = Storage::in_memory();
    let day_one = QuizServices::from_storage(&storage, Clock::fixed(fixed_now()), bank());
    answer_all(day_one.session_loop(), Mode::Stage(StageId::Legal), false).await;

    let tomorrow = Clock::fixed(fixed_now() + Duration::days(1));
    let day_two = QuizServices::from_storage(&storage, tomorrow, bank());
    let outcome = answer_all(day_two.session_loop(), Mode::Review, true).await;

    assert_eq!(outcome.result.stage_id(), StageId::Basics);
    assert_eq!(outcome.report.total, 1);
    assert_eq!(outcome.progress.streak, 2);

    let stat = outcome.progress.stat(&QuestionId::new("l1")).unwrap();
    assert_eq!(stat.attempts, 2);
    assert_eq!(stat.correct_count, 1);
    assert_eq!(stat.srs_level.value(), 1);
}

#[tokio::test]
async fn missed_answers_show_in_report() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), bank());
    let outcome = answer_all(services.session_loop(), Mode::Stage(StageId::Basics), false).await;

    assert_eq!(outcome.result.score(), 0);
    assert_eq!(outcome.report.missed.len(), 2);
    assert!(outcome.report.missed.iter().all(|m| m.selected_choice_text.is_some()));
    for stat in outcome.progress.question_stats.values() {
        assert!(stat.srs_level.is_reset());
        assert!(stat.next_review_date.is_none());
    }
}

#[tokio::test]
async fn finishing_twice_is_rejected() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), bank());
    let loop_svc = services.session_loop();
    let mut session = loop_svc.start_session(Mode::Stage(StageId::Legal), 10).await.unwrap();

    assert!(matches!(
        loop_svc.finish(&mut session).await,
        Err(SessionError::NotFinished)
    ));

    loop_svc.answer_current(&mut session, 0).unwrap();
    loop_svc.finish(&mut session).await.unwrap();
    assert!(matches!(
        loop_svc.finish(&mut session).await,
        Err(SessionError::Completed)
    ));

    let stored = services.progress().load().await.unwrap();
    assert_eq!(stored.sessions.len(), 1);
}

#[tokio::test]
async fn sqlite_backed_services_survive_reconnect() {
    let url = "sqlite:file:memdb_quiz_flow?mode=memory&cache=shared";
    let clock = Clock::fixed(fixed_now());

    let first = QuizServices::new_sqlite(url, clock, bank()).await.unwrap();
    answer_all(first.session_loop(), Mode::Stage(StageId::Basics), true).await;

    let second = QuizServices::new_sqlite(url, clock, bank()).await.unwrap();
    let progress = second.progress().load().await.unwrap();
    assert_eq!(progress.sessions.len(), 1);
    // keep the first pool alive so the shared in-memory database persists
    drop(first);
}
