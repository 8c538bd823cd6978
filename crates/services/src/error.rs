//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AnswerError, SessionResultError};
use quiz_core::scheduler::CommitError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this mode")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session has unanswered questions")]
    NotFinished,
    #[error(transparent)]
    InvalidChoice(#[from] AnswerError),
    #[error(transparent)]
    Result(#[from] SessionResultError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
