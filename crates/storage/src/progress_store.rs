use async_trait::async_trait;
use quiz_core::model::UserProgress;
use std::sync::Arc;
use tracing::debug;

use crate::repository::{KeyValueStore, ProgressRepository, StorageError};

/// Key the progress snapshot lives under.
pub const PROGRESS_KEY: &str = "quiz_progress";

/// Stores a [`UserProgress`] as one JSON blob in a [`KeyValueStore`].
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, PROGRESS_KEY)
    }

    #[must_use]
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Forget the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await
    }
}

#[async_trait]
impl ProgressRepository for ProgressStore {
    async fn load_progress(&self) -> Result<Option<UserProgress>, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            debug!(key = %self.key, "no progress snapshot stored");
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let raw = serde_json::to_string(progress)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.put(&self.key, &raw).await?;
        debug!(
            key = %self.key,
            sessions = progress.sessions.len(),
            bytes = raw.len(),
            "progress snapshot saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use chrono::NaiveDate;
    use quiz_core::model::{QuestionId, QuestionStat};

    fn store() -> (Arc<InMemoryStore>, ProgressStore) {
        let kv = Arc::new(InMemoryStore::new());
        let progress = ProgressStore::new(kv.clone());
        (kv, progress)
    }

    #[tokio::test]
    async fn absent_snapshot_loads_as_none() {
        let (_, progress) = store();
        assert!(progress.load_progress().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let (_, progress) = store();
        let mut snapshot = UserProgress::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        snapshot.streak = 4;
        snapshot.question_stats.insert(
            QuestionId::new("q1"),
            QuestionStat {
                attempts: 2,
                correct_count: 1,
                ..QuestionStat::default()
            },
        );

        progress.save_progress(&snapshot).await.unwrap();
        let loaded = progress.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_serialization_error() {
        let (kv, progress) = store();
        kv.put(PROGRESS_KEY, "{not json").await.unwrap();
        assert!(matches!(
            progress.load_progress().await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let (_, progress) = store();
        let snapshot = UserProgress::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        progress.save_progress(&snapshot).await.unwrap();
        progress.clear().await.unwrap();
        assert!(progress.load_progress().await.unwrap().is_none());
    }
}
