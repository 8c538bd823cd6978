use std::sync::Arc;
use tracing::{debug, warn};

use quiz_core::Clock;
use quiz_core::model::{SessionResult, UserProgress};
use quiz_core::scheduler::ReviewScheduler;
use storage::repository::{ProgressRepository, StorageError};

use crate::error::ProgressServiceError;

/// Loads, commits and saves the learner's progress snapshot.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    scheduler: ReviewScheduler,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            scheduler: ReviewScheduler::new(),
            repo,
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: ReviewScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Load the stored snapshot, or a fresh one starting today.
    ///
    /// A snapshot that cannot be decoded is replaced by a fresh default.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` when the backend itself fails.
    pub async fn load(&self) -> Result<UserProgress, ProgressServiceError> {
        match self.repo.load_progress().await {
            Ok(Some(progress)) => Ok(progress),
            Ok(None) => Ok(UserProgress::new(self.clock.today())),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "stored progress is unreadable, starting fresh");
                Ok(UserProgress::new(self.clock.today()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist `progress` as the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the snapshot cannot be stored.
    pub async fn save(&self, progress: &UserProgress) -> Result<(), ProgressServiceError> {
        self.repo.save_progress(progress).await?;
        Ok(())
    }

    /// Fold `session` into the stored snapshot and save the result.
    ///
    /// Nothing is written when the commit fails.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Commit` if the scheduler rejects the
    /// session, or `ProgressServiceError::Storage` on load/save failures.
    pub async fn commit(&self, session: SessionResult) -> Result<UserProgress, ProgressServiceError> {
        let current = self.load().await?;
        let now = self.clock.now();
        let session_id = session.id().clone();
        let answered = session.results().len();

        let next = self.scheduler.commit(&current, session, now)?;
        self.save(&next).await?;

        debug!(
            session = %session_id,
            answered,
            streak = next.streak,
            "session committed"
        );
        Ok(next)
    }
}
