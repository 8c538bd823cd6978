use std::sync::Arc;

use quiz_core::{Clock, QuestionBank};
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::SessionLoopService;

/// Assembles the services an app front end needs around one question bank.
#[derive(Clone)]
pub struct QuizServices {
    bank: Arc<QuestionBank>,
    progress: ProgressService,
    session_loop: SessionLoopService,
}

impl QuizServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank: QuestionBank,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, bank))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, bank: QuestionBank) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, bank)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, bank: QuestionBank) -> Self {
        let bank = Arc::new(bank);
        let progress = ProgressService::new(clock, Arc::clone(&storage.progress));
        let session_loop = SessionLoopService::new(clock, Arc::clone(&bank), progress.clone());
        Self {
            bank,
            progress,
            session_loop,
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn session_loop(&self) -> &SessionLoopService {
        &self.session_loop
    }
}
