//! Session and aggregate scoring.
//!
//! The aggregate score is the sum of five independently capped components.
//! Every ratio returns 0 when its denominator is 0. Stats whose question is no
//! longer in the bank are ignored.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::bank::QuestionBank;
use crate::model::{Question, QuestionResult, QuestionStat, StageId, UserProgress};

/// Upper bound of both the session score and the aggregate score.
pub const MAX_SCORE: u32 = 1000;
/// Aggregate score required to pass.
pub const PASSING_TOTAL: u32 = 800;
/// Accuracy every stage must reach to pass.
pub const PASSING_STAGE_ACCURACY: f64 = 0.7;

pub const BASIC_ACCURACY_CAP: f64 = 600.0;
pub const DIFFICULTY_BONUS_CAP: f64 = 200.0;
pub const WEAKNESS_BONUS_CAP: f64 = 100.0;
pub const STREAK_BONUS_CAP: f64 = 50.0;
pub const STREAK_POINTS_PER_DAY: u32 = 5;
pub const STAGE_COVERAGE_CAP: f64 = 50.0;

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}

/// Attempted questions that still exist in the bank, with their stats.
fn attempted<'a>(
    progress: &'a UserProgress,
    bank: &'a QuestionBank,
) -> impl Iterator<Item = (&'a Question, &'a QuestionStat)> {
    progress
        .attempted()
        .filter_map(|(id, stat)| bank.get(id).map(|q| (q, stat)))
}

//
// ─── SESSION SCORE ─────────────────────────────────────────────────────────────
//

/// `round(correct / answered * 1000)`, or `None` when nothing was answered.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn session_score(results: &[QuestionResult]) -> Option<u32> {
    if results.is_empty() {
        return None;
    }
    let correct = results.iter().filter(|r| r.is_correct).count();
    let score = (ratio(as_f64(correct), as_f64(results.len())) * f64::from(MAX_SCORE)).round();
    Some(score as u32)
}

//
// ─── COMPONENTS ────────────────────────────────────────────────────────────────
//

/// Overall accuracy scaled by how much of the bank has been attempted. Cap 600.
#[must_use]
pub fn basic_accuracy(progress: &UserProgress, bank: &QuestionBank) -> f64 {
    let mut attempts = 0_u64;
    let mut correct = 0_u64;
    let mut distinct = 0_usize;
    for (_, stat) in attempted(progress, bank) {
        attempts += u64::from(stat.attempts);
        correct += u64::from(stat.correct_count);
        distinct += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let accuracy = ratio(correct as f64, attempts as f64);
    let coverage = ratio(as_f64(distinct), as_f64(bank.len()));
    (accuracy * coverage * BASIC_ACCURACY_CAP).min(BASIC_ACCURACY_CAP)
}

/// Per-question accuracy weighted by difficulty, each worth `200 / bank size`. Cap 200.
#[must_use]
pub fn difficulty_bonus(progress: &UserProgress, bank: &QuestionBank) -> f64 {
    let per_question = ratio(DIFFICULTY_BONUS_CAP, as_f64(bank.len()));
    let bonus: f64 = attempted(progress, bank)
        .map(|(q, stat)| stat.accuracy() * q.difficulty().weight() * per_question)
        .sum();
    bonus.min(DIFFICULTY_BONUS_CAP)
}

/// Share of attempted questions that were both missed and later answered right. Cap 100.
#[must_use]
pub fn weakness_bonus(progress: &UserProgress, bank: &QuestionBank) -> f64 {
    let mut distinct = 0_usize;
    let mut improving = 0_usize;
    for (_, stat) in attempted(progress, bank) {
        distinct += 1;
        if stat.is_improving() {
            improving += 1;
        }
    }
    (ratio(as_f64(improving), as_f64(distinct)) * WEAKNESS_BONUS_CAP).min(WEAKNESS_BONUS_CAP)
}

/// Five points per streak day. Cap 50.
#[must_use]
pub fn streak_bonus(streak: u32) -> f64 {
    f64::from(streak.saturating_mul(STREAK_POINTS_PER_DAY)).min(STREAK_BONUS_CAP)
}

/// Fraction of stages with at least one attempted question. Cap 50.
#[must_use]
pub fn stage_coverage(progress: &UserProgress, bank: &QuestionBank) -> f64 {
    let covered: BTreeSet<StageId> = attempted(progress, bank)
        .map(|(q, _)| q.stage_id())
        .collect();
    (ratio(as_f64(covered.len()), as_f64(StageId::COUNT)) * STAGE_COVERAGE_CAP)
        .min(STAGE_COVERAGE_CAP)
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// The five score components before summing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub basic_accuracy: f64,
    pub difficulty_bonus: f64,
    pub weakness_bonus: f64,
    pub streak_bonus: f64,
    pub stage_coverage: f64,
}

impl ScoreBreakdown {
    /// Compute every component for `progress`. All zero when no session exists.
    #[must_use]
    pub fn compute(progress: &UserProgress, bank: &QuestionBank) -> Self {
        if !progress.has_sessions() {
            return Self::default();
        }
        Self {
            basic_accuracy: basic_accuracy(progress, bank),
            difficulty_bonus: difficulty_bonus(progress, bank),
            weakness_bonus: weakness_bonus(progress, bank),
            streak_bonus: streak_bonus(progress.streak),
            stage_coverage: stage_coverage(progress, bank),
        }
    }

    /// Sum of components, clamped to `[0, 1000]` and rounded.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn total(&self) -> u32 {
        let sum = self.basic_accuracy
            + self.difficulty_bonus
            + self.weakness_bonus
            + self.streak_bonus
            + self.stage_coverage;
        sum.clamp(0.0, f64::from(MAX_SCORE)).round() as u32
    }
}

/// Aggregate 0–1000 score. Recomputed from the snapshot on every call.
#[must_use]
pub fn total_score(progress: &UserProgress, bank: &QuestionBank) -> u32 {
    ScoreBreakdown::compute(progress, bank).total()
}

/// Passing needs the aggregate threshold and every stage at 70% accuracy.
#[must_use]
pub fn is_passing(progress: &UserProgress, bank: &QuestionBank) -> bool {
    if total_score(progress, bank) < PASSING_TOTAL {
        return false;
    }
    StageId::ALL
        .into_iter()
        .all(|stage| stage_accuracy(progress, bank, stage) >= PASSING_STAGE_ACCURACY)
}

/// Points still missing to reach the passing total.
#[must_use]
pub fn points_to_pass(progress: &UserProgress, bank: &QuestionBank) -> u32 {
    PASSING_TOTAL.saturating_sub(total_score(progress, bank))
}

//
// ─── BREAKDOWNS ────────────────────────────────────────────────────────────────
//

/// Correct answers over attempts across the stage's questions.
#[must_use]
pub fn stage_accuracy(progress: &UserProgress, bank: &QuestionBank, stage: StageId) -> f64 {
    let (attempts, correct) = bank
        .stage(stage)
        .filter_map(|q| progress.stat(q.id()))
        .fold((0_u64, 0_u64), |(a, c), s| {
            (a + u64::from(s.attempts), c + u64::from(s.correct_count))
        });
    #[allow(clippy::cast_precision_loss)]
    let accuracy = ratio(correct as f64, attempts as f64);
    accuracy
}

/// Share of the stage's questions attempted at least once.
#[must_use]
pub fn stage_progress(progress: &UserProgress, bank: &QuestionBank, stage: StageId) -> f64 {
    let mut pool = 0_usize;
    let mut attempted = 0_usize;
    for q in bank.stage(stage) {
        pool += 1;
        if progress.stat(q.id()).is_some_and(QuestionStat::is_attempted) {
            attempted += 1;
        }
    }
    ratio(as_f64(attempted), as_f64(pool))
}

/// Accumulated answers for one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TagAccuracy {
    pub correct: u64,
    pub total: u64,
    pub rate: f64,
}

/// Accuracy per tag over attempted questions.
///
/// A question with several tags contributes to each of them independently.
#[must_use]
pub fn tag_accuracy(progress: &UserProgress, bank: &QuestionBank) -> BTreeMap<String, TagAccuracy> {
    let mut tallies: BTreeMap<String, TagAccuracy> = BTreeMap::new();
    for q in bank.iter() {
        let Some(stat) = progress.stat(q.id()).filter(|s| s.is_attempted()) else {
            continue;
        };
        for tag in q.tags() {
            let entry = tallies.entry(tag.clone()).or_default();
            entry.total += u64::from(stat.attempts);
            entry.correct += u64::from(stat.correct_count);
        }
    }

    for entry in tallies.values_mut() {
        #[allow(clippy::cast_precision_loss)]
        let rate = ratio(entry.correct as f64, entry.total as f64);
        entry.rate = rate;
    }
    tallies
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
