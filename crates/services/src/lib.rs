#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod overview;
pub mod progress_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::QuizServices;
pub use error::{AppServicesError, ProgressServiceError, SessionError};
pub use overview::{ProgressOverview, StageSummary, WeakTag};
pub use progress_service::ProgressService;

pub use sessions::{
    AnswerFeedback, QuizSession, SelectionBuilder, SelectionPlan, SessionAnswerResult,
    SessionLoopService, SessionOutcome, SessionReport, Tier, review_count, select_questions,
};
