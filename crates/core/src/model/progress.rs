use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::session::SessionResult;

/// Accuracy below this ratio puts an attempted question in the struggling tier.
pub const STRUGGLING_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SrsLevelError {
    #[error("srs level must be between 0 and 3, got {0}")]
    OutOfRange(u8),
}

//
// ─── SRS LEVEL ─────────────────────────────────────────────────────────────────
//

/// Spaced-repetition mastery counter, 0 through 3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SrsLevel(u8);

impl SrsLevel {
    pub const MIN: SrsLevel = SrsLevel(0);
    pub const MAX: SrsLevel = SrsLevel(3);

    /// Creates a level, rejecting values above 3.
    ///
    /// # Errors
    ///
    /// Returns `SrsLevelError::OutOfRange` for values above 3.
    pub fn new(value: u8) -> Result<Self, SrsLevelError> {
        if value > Self::MAX.0 {
            return Err(SrsLevelError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// One step up, saturating at 3.
    #[must_use]
    pub fn promoted(self) -> Self {
        Self((self.0 + 1).min(Self::MAX.0))
    }

    #[must_use]
    pub fn is_reset(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for SrsLevel {
    type Error = SrsLevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SrsLevel> for u8 {
    fn from(level: SrsLevel) -> Self {
        level.0
    }
}

//
// ─── QUESTION STAT ─────────────────────────────────────────────────────────────
//

/// Per-question learning record, created on the first attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStat {
    pub attempts: u32,
    pub correct_count: u32,
    #[serde(default, alias = "lastAttempt", deserialize_with = "lenient_timestamp")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "nextReview")]
    pub next_review_date: Option<NaiveDate>,
    #[serde(default)]
    pub srs_level: SrsLevel,
}

impl QuestionStat {
    #[must_use]
    pub fn is_attempted(&self) -> bool {
        self.attempts > 0
    }

    /// `correct_count / attempts`, or 0 when never attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) / f64::from(self.attempts)
    }

    #[must_use]
    pub fn is_struggling(&self) -> bool {
        self.is_attempted() && self.accuracy() < STRUGGLING_THRESHOLD
    }

    /// Scheduled for review on or before `today`.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_attempted() && self.next_review_date.is_some_and(|d| d <= today)
    }

    /// Answered wrong at least once.
    #[must_use]
    pub fn has_misses(&self) -> bool {
        self.correct_count < self.attempts
    }

    /// Attempted at least twice, and both right and wrong at some point.
    #[must_use]
    pub fn is_improving(&self) -> bool {
        self.attempts >= 2 && self.correct_count > 0 && self.correct_count < self.attempts
    }
}

// Snapshots written by older clients store an empty string for "never".
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))))
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Root aggregate of a learner's history. Treated as an immutable snapshot:
/// commits produce a new value instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    #[serde(default)]
    pub sessions: Vec<SessionResult>,
    #[serde(default)]
    pub question_stats: BTreeMap<QuestionId, QuestionStat>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_study_date: Option<NaiveDate>,
    pub start_date: NaiveDate,
}

impl UserProgress {
    /// Fresh progress for a learner starting on `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            sessions: Vec::new(),
            question_stats: BTreeMap::new(),
            streak: 0,
            last_study_date: None,
            start_date: today,
        }
    }

    #[must_use]
    pub fn stat(&self, id: &QuestionId) -> Option<&QuestionStat> {
        self.question_stats.get(id)
    }

    #[must_use]
    pub fn has_sessions(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Stats for questions answered at least once.
    pub fn attempted(&self) -> impl Iterator<Item = (&QuestionId, &QuestionStat)> {
        self.question_stats.iter().filter(|(_, s)| s.is_attempted())
    }

    /// The most recent `n` sessions, oldest first.
    #[must_use]
    pub fn recent_sessions(&self, n: usize) -> &[SessionResult] {
        let start = self.sessions.len().saturating_sub(n);
        &self.sessions[start..]
    }
}
