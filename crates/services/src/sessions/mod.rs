mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SelectionBuilder, SelectionPlan, Tier, review_count, select_questions};
pub use progress::SessionProgress;
pub use service::{AnswerFeedback, QuizSession};
pub use view::{MissedQuestion, SessionReport, format_duration_ms};
pub use workflow::{SessionAnswerResult, SessionLoopService, SessionOutcome};
