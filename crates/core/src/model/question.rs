use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use crate::model::ids::{ChoiceId, QuestionId};
use crate::model::session::QuestionResult;
use crate::model::stage::StageId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("difficulty must be 1, 2 or 3, got {0}")]
    InvalidDifficulty(u8),

    #[error("question {0} has no choices")]
    NoChoices(QuestionId),

    #[error("question {question} repeats choice id {choice}")]
    DuplicateChoice {
        question: QuestionId,
        choice: ChoiceId,
    },

    #[error("question {question} marks {choice} correct but has no such choice")]
    MissingCorrectChoice {
        question: QuestionId,
        choice: ChoiceId,
    },

    #[error("question body cannot be empty")]
    EmptyBody,
}

/// Rejected answer for a presented question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("choice index {index} is out of range for {len} choices")]
    ChoiceOutOfRange { index: usize, len: usize },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Three-step difficulty rating carried by every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Basic,
    Standard,
    Applied,
}

impl Difficulty {
    /// Weight used by the difficulty bonus: `difficulty / 3`.
    #[must_use]
    pub fn weight(self) -> f64 {
        f64::from(u8::from(self)) / 3.0
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = QuestionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Basic),
            2 => Ok(Self::Standard),
            3 => Ok(Self::Applied),
            _ => Err(QuestionError::InvalidDifficulty(value)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Basic => 1,
            Difficulty::Standard => 2,
            Difficulty::Applied => 3,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
}

impl Choice {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: ChoiceId::new(id),
            text: text.into(),
        }
    }
}

/// Raw bank record, as it appears in the question bank JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub stage_id: StageId,
    pub difficulty: u8,
    pub body: String,
    pub choices: Vec<Choice>,
    #[serde(alias = "correct")]
    pub correct_choice_id: ChoiceId,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An immutable, validated bank question.
///
/// Invariants: at least one choice, choice ids unique within the question,
/// and `correct_choice_id` names exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    stage_id: StageId,
    difficulty: Difficulty,
    body: String,
    choices: Vec<Choice>,
    correct_choice_id: ChoiceId,
    explanation: String,
    tags: BTreeSet<String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let difficulty = Difficulty::try_from(record.difficulty)?;
        if record.body.trim().is_empty() {
            return Err(QuestionError::EmptyBody);
        }
        if record.choices.is_empty() {
            return Err(QuestionError::NoChoices(record.id));
        }

        let mut seen = HashSet::with_capacity(record.choices.len());
        for choice in &record.choices {
            if !seen.insert(&choice.id) {
                return Err(QuestionError::DuplicateChoice {
                    question: record.id.clone(),
                    choice: choice.id.clone(),
                });
            }
        }
        if !seen.contains(&record.correct_choice_id) {
            return Err(QuestionError::MissingCorrectChoice {
                question: record.id,
                choice: record.correct_choice_id,
            });
        }

        Ok(Self {
            id: record.id,
            stage_id: record.stage_id,
            difficulty,
            body: record.body,
            choices: record.choices,
            correct_choice_id: record.correct_choice_id,
            explanation: record.explanation,
            tags: record
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        })
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            stage_id: q.stage_id,
            difficulty: q.difficulty.into(),
            body: q.body,
            choices: q.choices,
            correct_choice_id: q.correct_choice_id,
            explanation: q.explanation,
            tags: q.tags.into_iter().collect(),
        }
    }
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    #[must_use]
    pub fn correct_choice_id(&self) -> &ChoiceId {
        &self.correct_choice_id
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Text of the choice with the given id, if the question has one.
    #[must_use]
    pub fn choice_text(&self, id: &ChoiceId) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.text.as_str())
    }

    /// Prepare this question for display with its choices in random order.
    #[must_use]
    pub fn present<R: Rng + ?Sized>(&self, rng: &mut R) -> PresentedQuestion {
        PresentedQuestion::shuffled(self, rng)
    }
}

//
// ─── PRESENTED QUESTION ────────────────────────────────────────────────────────
//

/// A question as shown to the learner: same content, choices permuted.
///
/// The correct answer is tracked by choice id; its index is only valid for
/// this particular presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    pub original_id: QuestionId,
    pub stage_id: StageId,
    pub difficulty: Difficulty,
    pub body: String,
    pub choices: Vec<Choice>,
    pub correct_choice_id: ChoiceId,
    pub explanation: String,
    pub tags: BTreeSet<String>,
}

impl PresentedQuestion {
    /// Copy `question` and shuffle its choices with a uniform permutation.
    pub fn shuffled<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Self {
        let mut choices = question.choices.clone();
        choices.shuffle(rng);
        Self {
            original_id: question.id.clone(),
            stage_id: question.stage_id,
            difficulty: question.difficulty,
            body: question.body.clone(),
            choices,
            correct_choice_id: question.correct_choice_id.clone(),
            explanation: question.explanation.clone(),
            tags: question.tags.clone(),
        }
    }

    /// Display index of the correct choice in this presentation.
    /// Validated questions always contain their correct choice.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.choices
            .iter()
            .position(|c| c.id == self.correct_choice_id)
            .unwrap_or_default()
    }

    /// Record the learner picking the choice shown at `selected_index`.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::ChoiceOutOfRange` if no choice is shown at that index.
    pub fn answer(
        &self,
        selected_index: usize,
        time_spent_ms: u64,
    ) -> Result<QuestionResult, AnswerError> {
        let selected = self
            .choices
            .get(selected_index)
            .ok_or(AnswerError::ChoiceOutOfRange {
                index: selected_index,
                len: self.choices.len(),
            })?;

        Ok(QuestionResult {
            question_id: self.original_id.clone(),
            selected_choice_index: selected_index,
            correct_choice_index: self.correct_index(),
            is_correct: selected.id == self.correct_choice_id,
            time_spent_ms,
            selected_choice_id: Some(selected.id.clone()),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record() -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::new("q1"),
            stage_id: StageId::Basics,
            difficulty: 2,
            body: "Which property does encryption protect?".into(),
            choices: vec![
                Choice::new("a", "Availability"),
                Choice::new("b", "Confidentiality"),
                Choice::new("c", "Integrity"),
                Choice::new("d", "Accountability"),
            ],
            correct_choice_id: ChoiceId::new("b"),
            explanation: "Encryption keeps data secret.".into(),
            tags: vec!["cia".into(), "crypto".into()],
        }
    }

    #[test]
    fn valid_record_converts() {
        let q = Question::try_from(record()).unwrap();
        assert_eq!(q.difficulty(), Difficulty::Standard);
        assert_eq!(q.tags().len(), 2);
        assert_eq!(
            q.choice_text(&ChoiceId::new("b")),
            Some("Confidentiality")
        );
    }

    #[test]
    fn rejects_missing_correct_choice() {
        let mut r = record();
        r.correct_choice_id = ChoiceId::new("z");
        assert!(matches!(
            Question::try_from(r),
            Err(QuestionError::MissingCorrectChoice { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_choice_ids() {
        let mut r = record();
        r.choices.push(Choice::new("a", "Again"));
        assert!(matches!(
            Question::try_from(r),
            Err(QuestionError::DuplicateChoice { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_difficulty() {
        let mut r = record();
        r.difficulty = 4;
        assert_eq!(
            Question::try_from(r).unwrap_err(),
            QuestionError::InvalidDifficulty(4)
        );
    }

    #[test]
    fn accepts_legacy_correct_key() {
        let json = r#"{
            "id": "q9", "stageId": "legal", "difficulty": 1,
            "body": "b", "choices": [{"id": "x", "text": "X"}],
            "correct": "x", "explanation": "", "tags": []
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_choice_id(), &ChoiceId::new("x"));
    }

    #[test]
    fn presented_question_tracks_correct_choice_by_id() {
        let q = Question::try_from(record()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let p = q.present(&mut rng);
            let idx = p.correct_index();
            assert_eq!(p.choices[idx].id, ChoiceId::new("b"));

            let result = p.answer(idx, 1_000).unwrap();
            assert!(result.is_correct);
            assert_eq!(result.correct_choice_index, idx);
            assert_eq!(result.question_id, QuestionId::new("q1"));
        }
    }

    #[test]
    fn correct_index_found_at_every_position() {
        let mut rng = StdRng::seed_from_u64(3);
        for correct in ["a", "b", "c", "d"] {
            let mut r = record();
            r.correct_choice_id = ChoiceId::new(correct);
            let q = Question::try_from(r).unwrap();
            for _ in 0..10 {
                let p = q.present(&mut rng);
                let idx = p.correct_index();
                assert_eq!(p.choices[idx].id, ChoiceId::new(correct));
                assert_eq!(
                    p.choices.iter().filter(|c| c.id == p.correct_choice_id).count(),
                    1
                );
            }
        }
    }

    #[test]
    fn answer_rejects_out_of_range_index() {
        let q = Question::try_from(record()).unwrap();
        let p = q.present(&mut StdRng::seed_from_u64(1));
        assert_eq!(
            p.answer(4, 0).unwrap_err(),
            AnswerError::ChoiceOutOfRange { index: 4, len: 4 }
        );
    }

    #[test]
    fn difficulty_weight_is_fraction_of_three() {
        assert!((Difficulty::Applied.weight() - 1.0).abs() < f64::EPSILON);
        assert!((Difficulty::Basic.weight() - 1.0 / 3.0).abs() < 1e-12);
    }
}
