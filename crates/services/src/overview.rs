//! Read-only progress dashboards computed from a snapshot and the bank.

use chrono::NaiveDate;
use serde::Serialize;

use quiz_core::QuestionBank;
use quiz_core::model::{SessionResult, StageId, UserProgress};
use quiz_core::scoring::{self, ScoreBreakdown, TagAccuracy};

use crate::sessions::review_count;

/// Tags whose accuracy is below this rate are reported as weak.
pub const WEAK_TAG_THRESHOLD: f64 = 0.5;
pub const WEAK_TAG_LIMIT: usize = 5;
pub const RECENT_SESSION_LIMIT: usize = 10;

/// Per-stage figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage_id: StageId,
    pub name: &'static str,
    pub description: &'static str,
    pub question_count: usize,
    pub progress: f64,
    pub accuracy: f64,
    pub best_score: Option<u32>,
    pub session_count: usize,
}

impl StageSummary {
    fn build(stage: StageId, progress: &UserProgress, bank: &QuestionBank) -> Self {
        let sessions = progress.sessions.iter().filter(|s| s.stage_id() == stage);
        Self {
            stage_id: stage,
            name: stage.display_name(),
            description: stage.description(),
            question_count: bank.stage_size(stage),
            progress: scoring::stage_progress(progress, bank, stage),
            accuracy: scoring::stage_accuracy(progress, bank, stage),
            best_score: sessions.clone().map(SessionResult::score).max(),
            session_count: sessions.count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakTag {
    pub tag: String,
    #[serde(flatten)]
    pub accuracy: TagAccuracy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSession {
    pub stage_id: StageId,
    pub date: chrono::DateTime<chrono::Utc>,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
}

impl From<&SessionResult> for RecentSession {
    fn from(s: &SessionResult) -> Self {
        Self {
            stage_id: s.stage_id(),
            date: s.date(),
            score: s.score(),
            correct: s.correct_count(),
            total: s.results().len(),
        }
    }
}

/// Everything the status screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub is_passing: bool,
    pub points_to_pass: u32,
    pub review_count: usize,
    pub streak: u32,
    pub attempted_questions: usize,
    pub session_count: usize,
    pub stages: Vec<StageSummary>,
    pub recommended_stage: StageId,
    pub weak_tags: Vec<WeakTag>,
    /// Most recent last.
    pub recent_sessions: Vec<RecentSession>,
}

impl ProgressOverview {
    #[must_use]
    pub fn build(progress: &UserProgress, bank: &QuestionBank, today: NaiveDate) -> Self {
        let breakdown = ScoreBreakdown::compute(progress, bank);
        let stages: Vec<StageSummary> = StageId::ALL
            .iter()
            .map(|&stage| StageSummary::build(stage, progress, bank))
            .collect();

        Self {
            total_score: breakdown.total(),
            breakdown,
            is_passing: scoring::is_passing(progress, bank),
            points_to_pass: scoring::points_to_pass(progress, bank),
            review_count: review_count(bank, progress, today),
            streak: progress.streak,
            attempted_questions: progress
                .attempted()
                .filter(|(id, _)| bank.contains(id))
                .count(),
            session_count: progress.sessions.len(),
            recommended_stage: recommended_stage(&stages),
            stages,
            weak_tags: weakest_tags(progress, bank),
            recent_sessions: progress
                .recent_sessions(RECENT_SESSION_LIMIT)
                .iter()
                .map(RecentSession::from)
                .collect(),
        }
    }

    #[must_use]
    pub fn stage(&self, stage: StageId) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage_id == stage)
    }
}

/// Stage with the lowest progress; on a tie the later stage wins.
#[must_use]
pub fn recommended_stage(stages: &[StageSummary]) -> StageId {
    stages
        .iter()
        .fold(None::<&StageSummary>, |best, s| match best {
            Some(b) if b.progress < s.progress => Some(b),
            _ => Some(s),
        })
        .map_or(StageId::CANONICAL_REVIEW, |s| s.stage_id)
}

/// Up to five tags below 50% accuracy, weakest first.
#[must_use]
pub fn weakest_tags(progress: &UserProgress, bank: &QuestionBank) -> Vec<WeakTag> {
    let mut weak: Vec<WeakTag> = scoring::tag_accuracy(progress, bank)
        .into_iter()
        .filter(|(_, acc)| acc.rate < WEAK_TAG_THRESHOLD)
        .map(|(tag, accuracy)| WeakTag { tag, accuracy })
        .collect();
    weak.sort_by(|a, b| a.accuracy.rate.total_cmp(&b.accuracy.rate));
    weak.truncate(WEAK_TAG_LIMIT);
    weak
}
