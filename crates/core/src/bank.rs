use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Question, QuestionId, StageId};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question bank is empty")]
    Empty,
}

/// Static, read-only catalog of questions.
///
/// Loaded once at startup and never mutated. Lookups by id go through an
/// index so stale ids can be detected cheaply.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank from already-validated questions, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and
    /// `BankError::DuplicateQuestion` when two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }

        let mut index = HashMap::with_capacity(questions.len());
        for (pos, q) in questions.iter().enumerate() {
            if index.insert(q.id().clone(), pos).is_some() {
                return Err(BankError::DuplicateQuestion(q.id().clone()));
            }
        }

        Ok(Self { questions, index })
    }

    /// Parse a JSON array of question records.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` if the JSON is malformed or a record fails
    /// validation, plus the errors of [`QuestionBank::new`].
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).map(|&pos| &self.questions[pos])
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.index.contains_key(id)
    }

    /// All questions in bank order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Questions belonging to `stage`, in bank order.
    pub fn stage(&self, stage: StageId) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.stage_id() == stage)
    }

    #[must_use]
    pub fn stage_size(&self, stage: StageId) -> usize {
        self.stage(stage).count()
    }
}
