use chrono::{DateTime, Utc};

use quiz_core::model::{
    ChoiceId, Mode, PresentedQuestion, QuestionResult, SessionId, SessionResult,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Immediate feedback after answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub result: QuestionResult,
    pub correct_choice_id: ChoiceId,
    pub correct_choice_text: String,
    pub explanation: String,
}

impl AnswerFeedback {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.result.is_correct
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.result.correct_choice_index
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz session over a fixed list of presented questions.
///
/// Questions are answered in order. Time spent on a question is measured
/// from the previous answer (or the session start) to this one.
pub struct QuizSession {
    id: SessionId,
    mode: Mode,
    questions: Vec<PresentedQuestion>,
    results: Vec<QuestionResult>,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    committed: bool,
}

fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_milliseconds()).unwrap_or(0)
}

impl QuizSession {
    /// Start a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if there is nothing to ask.
    pub fn new(
        mode: Mode,
        questions: Vec<PresentedQuestion>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            id: SessionId::generate(),
            mode,
            questions,
            results: Vec::new(),
            started_at,
            question_started_at: started_at,
            completed_at: None,
            committed: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[PresentedQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.len() >= self.questions.len()
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }

    /// Zero-based position of the question being asked.
    #[must_use]
    pub fn position(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&PresentedQuestion> {
        self.questions.get(self.results.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.results.len();
        SessionProgress {
            total: self.questions.len(),
            answered,
            remaining: self.questions.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Answer the current question with the choice displayed at `selected_index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if every question is already answered,
    /// or `SessionError::InvalidChoice` if the index is out of range. A
    /// rejected answer leaves the session unchanged.
    pub fn answer(
        &mut self,
        selected_index: usize,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerFeedback, SessionError> {
        let question = self.current_question().ok_or(SessionError::Completed)?;
        let time_spent_ms = elapsed_ms(self.question_started_at, answered_at);
        let result = question.answer(selected_index, time_spent_ms)?;

        let correct_choice_text = question
            .choices
            .get(result.correct_choice_index)
            .map(|c| c.text.clone())
            .unwrap_or_default();
        let feedback = AnswerFeedback {
            correct_choice_id: question.correct_choice_id.clone(),
            correct_choice_text,
            explanation: question.explanation.clone(),
            result: result.clone(),
        };

        self.results.push(result);
        self.question_started_at = answered_at;
        if self.is_complete() {
            self.completed_at = Some(answered_at);
        }
        Ok(feedback)
    }

    /// Build the immutable session record once every question is answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while questions remain.
    pub fn to_result(&self) -> Result<SessionResult, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotFinished)?;
        let total_time_ms = elapsed_ms(self.started_at, completed_at);
        let result = SessionResult::new(
            self.id.clone(),
            self.mode,
            self.started_at,
            self.results.clone(),
            total_time_ms,
        )?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Question, StageId};
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn presented(id: &str) -> PresentedQuestion {
        let raw = format!(
            r#"{{"id": "{id}", "stageId": "legal", "difficulty": 2, "body": "{id}?",
                "choices": [{{"id": "x", "text": "X"}}, {{"id": "y", "text": "Y"}}],
                "correctChoiceId": "y", "explanation": "Because Y."}}"#
        );
        let question: Question = serde_json::from_str(&raw).unwrap();
        question.present(&mut StdRng::seed_from_u64(5))
    }

    fn session() -> QuizSession {
        QuizSession::new(
            Mode::Stage(StageId::Legal),
            vec![presented("l1"), presented("l2")],
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        assert!(matches!(
            QuizSession::new(Mode::Review, Vec::new(), fixed_now()),
            Err(SessionError::Empty)
        ));
    }

    #[test]
    fn feedback_reports_correct_choice_and_explanation() {
        let mut session = session();
        let correct = session.current_question().unwrap().correct_index();

        let feedback = session
            .answer(1 - correct, fixed_now() + Duration::seconds(4))
            .unwrap();

        assert!(!feedback.is_correct());
        assert_eq!(feedback.correct_index(), correct);
        assert_eq!(feedback.correct_choice_id.as_str(), "y");
        assert_eq!(feedback.correct_choice_text, "Y");
        assert_eq!(feedback.explanation, "Because Y.");
        assert_eq!(feedback.result.time_spent_ms, 4_000);
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn out_of_range_answer_leaves_session_unchanged() {
        let mut session = session();
        let err = session.answer(5, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidChoice(_)));
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn result_requires_every_answer() {
        let mut session = session();
        session.answer(0, fixed_now() + Duration::seconds(3)).unwrap();
        assert!(matches!(session.to_result(), Err(SessionError::NotFinished)));

        session.answer(0, fixed_now() + Duration::seconds(10)).unwrap();
        assert!(session.is_complete());
        assert!(matches!(
            session.answer(0, fixed_now() + Duration::seconds(11)),
            Err(SessionError::Completed)
        ));

        let result = session.to_result().unwrap();
        assert_eq!(result.total_time_ms(), 10_000);
        assert_eq!(result.results()[1].time_spent_ms, 7_000);
        assert_eq!(result.stage_id(), StageId::Legal);
        assert_eq!(session.progress().remaining, 0);
    }
}
