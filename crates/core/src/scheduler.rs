use chrono::{DateTime, Days, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{QuestionId, QuestionStat, SessionResult, SrsLevel, UserProgress};

/// Days until the next review for SRS levels 1, 2 and 3.
pub const DEFAULT_INTERVAL_DAYS: [u32; 3] = [1, 3, 7];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("review intervals must be positive and non-decreasing, got {provided:?}")]
    InvalidIntervals { provided: [u32; 3] },
}

/// Why a session could not be folded into a progress snapshot.
///
/// The input snapshot is left untouched whenever one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommitError {
    #[error("answer counters for question {0} would overflow")]
    CounterOverflow(QuestionId),

    #[error("study streak would overflow")]
    StreakOverflow,

    #[error("review date {days} days after {from} is out of range")]
    DateOutOfRange { from: NaiveDate, days: u32 },
}

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

/// Study streak after a commit on `today`.
///
/// Same day keeps the streak, the day after extends it, anything else
/// restarts it at 1.
///
/// # Errors
///
/// Returns `CommitError::StreakOverflow` if the streak cannot be extended.
pub fn next_streak(
    streak: u32,
    last_study_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<u32, CommitError> {
    match last_study_date {
        Some(last) if last == today => Ok(streak),
        Some(last) if today.pred_opt() == Some(last) => {
            streak.checked_add(1).ok_or(CommitError::StreakOverflow)
        }
        _ => Ok(1),
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Fixed-interval spaced-repetition scheduler.
///
/// A correct answer promotes a question one level (max 3), a wrong answer
/// resets it to 0. Levels 1–3 schedule the next review a fixed number of days
/// out; level 0 clears the review date so the question resurfaces through its
/// accuracy instead.
///
/// # Examples
///
/// ```
/// # use quiz_core::scheduler::ReviewScheduler;
/// let scheduler = ReviewScheduler::new();
/// let now = quiz_core::time::fixed_now();
/// let stat = scheduler.apply(&"q1".parse()?, None, true, now)?;
///
/// assert_eq!(stat.srs_level.value(), 1);
/// assert_eq!(stat.next_review_date, now.date_naive().succ_opt());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewScheduler {
    intervals: [u32; 3],
}

impl ReviewScheduler {
    /// Scheduler with the default 1/3/7-day table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            intervals: DEFAULT_INTERVAL_DAYS,
        }
    }

    /// Scheduler with a custom interval table, indexed by level − 1.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidIntervals` if any interval is zero or
    /// the table decreases.
    pub fn try_with_intervals(intervals: [u32; 3]) -> Result<Self, SchedulerError> {
        let positive = intervals.iter().all(|&d| d > 0);
        let ordered = intervals.windows(2).all(|w| w[0] <= w[1]);
        if !positive || !ordered {
            return Err(SchedulerError::InvalidIntervals {
                provided: intervals,
            });
        }
        Ok(Self { intervals })
    }

    #[must_use]
    pub fn intervals(&self) -> [u32; 3] {
        self.intervals
    }

    /// Review date for a question that just reached `level` on `today`.
    ///
    /// # Errors
    ///
    /// Returns `CommitError::DateOutOfRange` if the date cannot be represented.
    pub fn next_review_date(
        &self,
        level: SrsLevel,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, CommitError> {
        let Some(index) = usize::from(level.value()).checked_sub(1) else {
            return Ok(None);
        };
        let days = self.intervals[index];
        today
            .checked_add_days(Days::new(u64::from(days)))
            .map(Some)
            .ok_or(CommitError::DateOutOfRange { from: today, days })
    }

    /// Fold one answer into a question's stat, creating it on first attempt.
    ///
    /// # Errors
    ///
    /// Returns `CommitError::CounterOverflow` if the counters cannot grow and
    /// `CommitError::DateOutOfRange` if the review date overflows.
    pub fn apply(
        &self,
        question_id: &QuestionId,
        previous: Option<&QuestionStat>,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Result<QuestionStat, CommitError> {
        let base = previous.cloned().unwrap_or_default();
        let overflow = || CommitError::CounterOverflow(question_id.clone());

        let attempts = base.attempts.checked_add(1).ok_or_else(overflow)?;
        let correct_count = base
            .correct_count
            .checked_add(u32::from(is_correct))
            .ok_or_else(overflow)?;

        let srs_level = if is_correct {
            base.srs_level.promoted()
        } else {
            SrsLevel::MIN
        };
        let next_review_date = self.next_review_date(srs_level, answered_at.date_naive())?;

        Ok(QuestionStat {
            attempts,
            correct_count,
            last_attempt_at: Some(answered_at),
            next_review_date,
            srs_level,
        })
    }

    /// Produce the snapshot that results from committing `session` at `now`.
    ///
    /// Updates the streak once, appends the session, then applies the SRS
    /// transition for every answer in order. `progress` itself is never
    /// modified, so on error the caller still holds the original snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CommitError` if a counter, the streak, or a review date
    /// overflows.
    pub fn commit(
        &self,
        progress: &UserProgress,
        session: SessionResult,
        now: DateTime<Utc>,
    ) -> Result<UserProgress, CommitError> {
        let today = now.date_naive();
        let mut next = progress.clone();

        next.streak = next_streak(progress.streak, progress.last_study_date, today)?;
        next.last_study_date = Some(today);

        for result in session.results() {
            let stat = self.apply(
                &result.question_id,
                next.question_stats.get(&result.question_id),
                result.is_correct,
                now,
            )?;
            next.question_stats.insert(result.question_id.clone(), stat);
        }

        next.sessions.push(session);
        Ok(next)
    }
}

impl Default for ReviewScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Commit `session` into `progress` with the default interval table.
///
/// # Errors
///
/// See [`ReviewScheduler::commit`].
pub fn add_session_result(
    progress: &UserProgress,
    session: SessionResult,
    now: DateTime<Utc>,
) -> Result<UserProgress, CommitError> {
    ReviewScheduler::new().commit(progress, session, now)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
