use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChoiceId, QuestionId, SessionId};
use crate::model::stage::{Mode, StageId};
use crate::scoring;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionResultError {
    #[error("a session needs at least one answered question")]
    NoResults,
}

/// One answer event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: QuestionId,
    #[serde(alias = "selectedIndex")]
    pub selected_choice_index: usize,
    #[serde(alias = "correctIndex")]
    pub correct_choice_index: usize,
    pub is_correct: bool,
    #[serde(alias = "timeSpent")]
    pub time_spent_ms: u64,
    /// Choice picked, by id. Absent in snapshots written before it was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_choice_id: Option<ChoiceId>,
}

/// A completed session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    id: SessionId,
    stage_id: StageId,
    date: DateTime<Utc>,
    results: Vec<QuestionResult>,
    score: u32,
    #[serde(alias = "totalTime")]
    total_time_ms: u64,
}

impl SessionResult {
    /// Build a session from its answers, computing the session score.
    ///
    /// Review-mode sessions are recorded under the canonical review stage.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::NoResults` if `results` is empty.
    pub fn new(
        id: SessionId,
        mode: Mode,
        date: DateTime<Utc>,
        results: Vec<QuestionResult>,
        total_time_ms: u64,
    ) -> Result<Self, SessionResultError> {
        let score = scoring::session_score(&results).ok_or(SessionResultError::NoResults)?;
        Ok(Self {
            id,
            stage_id: mode.resolved_stage(),
            date,
            results,
            score,
            total_time_ms,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct).count()
    }

    /// Answers that were wrong, in the order they were given.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn result(id: &str, correct: bool) -> QuestionResult {
        QuestionResult {
            question_id: QuestionId::new(id),
            selected_choice_index: 0,
            correct_choice_index: if correct { 0 } else { 1 },
            is_correct: correct,
            time_spent_ms: 500,
            selected_choice_id: None,
        }
    }

    #[test]
    fn new_computes_score() {
        let session = SessionResult::new(
            SessionId::generate(),
            Mode::Stage(StageId::Legal),
            fixed_now(),
            vec![result("a", true), result("b", false), result("c", true)],
            9_000,
        )
        .unwrap();

        assert_eq!(session.score(), 667);
        assert_eq!(session.correct_count(), 2);
        assert_eq!(session.missed().count(), 1);
        assert_eq!(session.stage_id(), StageId::Legal);
    }

    #[test]
    fn review_sessions_use_canonical_stage() {
        let session = SessionResult::new(
            SessionId::generate(),
            Mode::Review,
            fixed_now(),
            vec![result("a", true)],
            1,
        )
        .unwrap();
        assert_eq!(session.stage_id(), StageId::CANONICAL_REVIEW);
    }

    #[test]
    fn empty_session_is_rejected() {
        let err = SessionResult::new(
            SessionId::generate(),
            Mode::Review,
            fixed_now(),
            Vec::new(),
            0,
        )
        .unwrap_err();
        assert_eq!(err, SessionResultError::NoResults);
    }

    #[test]
    fn deserializes_legacy_field_names() {
        let json = r#"{
            "questionId": "q1", "selectedIndex": 2, "correctIndex": 1,
            "isCorrect": false, "timeSpent": 4200
        }"#;
        let r: QuestionResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.selected_choice_index, 2);
        assert_eq!(r.time_spent_ms, 4200);
        assert!(r.selected_choice_id.is_none());
    }
}
