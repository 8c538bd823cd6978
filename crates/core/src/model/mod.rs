mod ids;
mod progress;
mod question;
mod session;
mod stage;

pub use ids::{ChoiceId, ParseIdError, QuestionId, SessionId};

pub use progress::{QuestionStat, STRUGGLING_THRESHOLD, SrsLevel, SrsLevelError, UserProgress};
pub use question::{
    AnswerError, Choice, Difficulty, PresentedQuestion, Question, QuestionError, QuestionRecord,
};
pub use session::{QuestionResult, SessionResult, SessionResultError};
pub use stage::{Mode, StageError, StageId};
