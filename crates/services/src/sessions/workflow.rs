use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info};

use quiz_core::model::{Mode, SessionResult, UserProgress};
use quiz_core::{Clock, QuestionBank};

use super::plan::SelectionBuilder;
use super::service::{AnswerFeedback, QuizSession};
use super::view::SessionReport;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

/// Result of answering a single question in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub feedback: AnswerFeedback,
    pub is_complete: bool,
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub result: SessionResult,
    pub report: SessionReport,
    pub progress: UserProgress,
}

/// Orchestrates session start, answering and the final commit.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    progress: ProgressService,
    seed: Option<u64>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, bank: Arc<QuestionBank>, progress: ProgressService) -> Self {
        Self {
            clock,
            bank,
            progress,
            seed: None,
        }
    }

    /// Use a fixed RNG seed for selection and choice shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Select questions for `mode` and start a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when nothing is eligible, or a progress
    /// error if the snapshot cannot be loaded.
    pub async fn start_session(
        &self,
        mode: Mode,
        count: usize,
    ) -> Result<QuizSession, SessionError> {
        let progress = self.progress.load().await?;
        let now = self.clock.now();
        let builder = SelectionBuilder::new(&self.bank, &progress, now.date_naive());

        let plan = match self.seed {
            Some(seed) => builder.build(mode, count, &mut StdRng::seed_from_u64(seed)),
            None => builder.build(mode, count, &mut rand::rng()),
        };
        debug!(%mode, selected = plan.total(), tiers = ?plan.tier_counts, "selection planned");

        QuizSession::new(mode, plan.questions, now)
    }

    /// Answer the current question with the choice displayed at `selected_index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is complete or the index is invalid.
    pub fn answer_current(
        &self,
        session: &mut QuizSession,
        selected_index: usize,
    ) -> Result<SessionAnswerResult, SessionError> {
        let feedback = session.answer(selected_index, self.clock.now())?;
        Ok(SessionAnswerResult {
            feedback,
            is_complete: session.is_complete(),
        })
    }

    /// Commit a completed session into the stored progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while questions remain,
    /// `SessionError::Completed` if the session was already committed, or a
    /// progress error if committing or saving fails.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<SessionOutcome, SessionError> {
        if session.is_committed() {
            return Err(SessionError::Completed);
        }

        let result = session.to_result()?;
        let report = SessionReport::build(&result, &self.bank);
        let progress = self.progress.commit(result.clone()).await?;
        session.mark_committed();

        info!(
            session = %result.id(),
            stage = %result.stage_id(),
            score = result.score(),
            correct = report.correct,
            total = report.total,
            "session finished"
        );

        Ok(SessionOutcome {
            result,
            report,
            progress,
        })
    }
}
