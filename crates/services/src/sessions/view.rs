use serde::Serialize;

use quiz_core::QuestionBank;
use quiz_core::model::{QuestionId, SessionResult, StageId};

/// Format milliseconds as `m:ss`.
#[must_use]
pub fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// A question the learner got wrong, resolved against the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedQuestion {
    pub question_id: QuestionId,
    pub body: String,
    pub selected_choice_text: Option<String>,
    pub correct_choice_text: String,
    pub explanation: String,
}

/// Summary shown after a session is finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub stage_id: StageId,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    /// Rounded percentage, 0 to 100.
    pub accuracy_percent: u32,
    pub elapsed: String,
    pub missed: Vec<MissedQuestion>,
}

impl SessionReport {
    /// Build a report for `session`. Missed questions no longer in the bank
    /// are skipped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn build(session: &SessionResult, bank: &QuestionBank) -> Self {
        let total = session.results().len();
        let correct = session.correct_count();
        let accuracy_percent = if total == 0 {
            0
        } else {
            (correct as f64 / total as f64 * 100.0).round() as u32
        };

        let missed = session
            .missed()
            .filter_map(|r| {
                let question = bank.get(&r.question_id)?;
                Some(MissedQuestion {
                    question_id: r.question_id.clone(),
                    body: question.body().to_owned(),
                    selected_choice_text: r
                        .selected_choice_id
                        .as_ref()
                        .and_then(|id| question.choice_text(id))
                        .map(str::to_owned),
                    correct_choice_text: question
                        .choice_text(question.correct_choice_id())
                        .unwrap_or_default()
                        .to_owned(),
                    explanation: question.explanation().to_owned(),
                })
            })
            .collect();

        Self {
            stage_id: session.stage_id(),
            score: session.score(),
            correct,
            total,
            accuracy_percent,
            elapsed: format_duration_ms(session.total_time_ms()),
            missed,
        }
    }
}
