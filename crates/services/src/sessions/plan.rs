use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;

use quiz_core::QuestionBank;
use quiz_core::model::{Mode, PresentedQuestion, Question, QuestionStat, UserProgress};

//
// ─── TIERS ─────────────────────────────────────────────────────────────────────
//

/// Priority bucket a candidate question falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Unlearned,
    Due,
    Struggling,
    Recovering,
    Mastered,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Unlearned => "unlearned",
            Tier::Due => "due",
            Tier::Struggling => "struggling",
            Tier::Recovering => "recovering",
            Tier::Mastered => "mastered",
        };
        f.write_str(label)
    }
}

type TierPredicate = fn(Option<&QuestionStat>, NaiveDate) -> bool;

fn unlearned(stat: Option<&QuestionStat>, _today: NaiveDate) -> bool {
    stat.is_none_or(|s| !s.is_attempted())
}

fn struggling(stat: Option<&QuestionStat>, _today: NaiveDate) -> bool {
    stat.is_some_and(QuestionStat::is_struggling)
}

fn mastered(_stat: Option<&QuestionStat>, _today: NaiveDate) -> bool {
    true
}

fn due(stat: Option<&QuestionStat>, today: NaiveDate) -> bool {
    stat.is_some_and(|s| s.is_due(today))
}

fn recovering(stat: Option<&QuestionStat>, _today: NaiveDate) -> bool {
    stat.is_some_and(|s| s.is_attempted() && s.has_misses())
}

/// Stage mode: every question of the stage lands in some tier.
const STAGE_TIERS: &[(Tier, TierPredicate)] = &[
    (Tier::Unlearned, unlearned),
    (Tier::Struggling, struggling),
    (Tier::Mastered, mastered),
];

/// Review mode: questions matching no tier (including never-attempted ones)
/// are left out.
const REVIEW_TIERS: &[(Tier, TierPredicate)] = &[
    (Tier::Due, due),
    (Tier::Struggling, struggling),
    (Tier::Recovering, recovering),
];

fn tiers_for(mode: Mode) -> &'static [(Tier, TierPredicate)] {
    match mode {
        Mode::Stage(_) => STAGE_TIERS,
        Mode::Review => REVIEW_TIERS,
    }
}

/// First tier in `table` whose predicate accepts the stat.
fn classify(
    table: &[(Tier, TierPredicate)],
    stat: Option<&QuestionStat>,
    today: NaiveDate,
) -> Option<usize> {
    table.iter().position(|(_, accepts)| accepts(stat, today))
}

//
// ─── PLAN ──────────────────────────────────────────────────────────────────────
//

/// Selection result for a quiz session.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPlan {
    pub mode: Mode,
    pub questions: Vec<PresentedQuestion>,
    /// Selected count per tier, in priority order.
    pub tier_counts: Vec<(Tier, usize)>,
}

impl SelectionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when nothing was eligible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Number of selected questions that came from `tier`.
    #[must_use]
    pub fn selected_from(&self, tier: Tier) -> usize {
        self.tier_counts
            .iter()
            .find(|(t, _)| *t == tier)
            .map_or(0, |(_, n)| *n)
    }
}

/// Orders bank questions for a session by tier, shuffling within each tier.
pub struct SelectionBuilder<'a> {
    bank: &'a QuestionBank,
    progress: &'a UserProgress,
    today: NaiveDate,
}

impl<'a> SelectionBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank, progress: &'a UserProgress, today: NaiveDate) -> Self {
        Self {
            bank,
            progress,
            today,
        }
    }

    fn candidates(&self, mode: Mode) -> Box<dyn Iterator<Item = &'a Question> + 'a> {
        match mode {
            Mode::Stage(stage) => Box::new(self.bank.stage(stage)),
            Mode::Review => Box::new(self.bank.iter()),
        }
    }

    /// Build a plan of at most `count` questions.
    ///
    /// Tiers are shuffled independently and concatenated in priority order,
    /// then truncated. Each selected question gets its own choice permutation.
    /// An empty pool yields an empty plan.
    pub fn build<R: Rng + ?Sized>(self, mode: Mode, count: usize, rng: &mut R) -> SelectionPlan {
        let table = tiers_for(mode);
        let mut buckets: Vec<Vec<&Question>> = vec![Vec::new(); table.len()];

        for question in self.candidates(mode) {
            let stat = self.progress.stat(question.id());
            if let Some(slot) = classify(table, stat, self.today) {
                buckets[slot].push(question);
            }
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        let mut tier_counts = Vec::with_capacity(table.len());

        for ((tier, _), mut bucket) in table.iter().zip(buckets) {
            bucket.as_mut_slice().shuffle(rng);
            let before = selected.len();
            for question in bucket {
                if selected.len() == count {
                    break;
                }
                if seen.insert(question.id()) {
                    selected.push(question);
                }
            }
            tier_counts.push((*tier, selected.len() - before));
        }

        let questions = selected.into_iter().map(|q| q.present(rng)).collect();

        SelectionPlan {
            mode,
            questions,
            tier_counts,
        }
    }
}

/// Select up to `count` presented questions for `mode`.
pub fn select_questions<R: Rng + ?Sized>(
    bank: &QuestionBank,
    progress: &UserProgress,
    mode: Mode,
    count: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<PresentedQuestion> {
    SelectionBuilder::new(bank, progress, today)
        .build(mode, count, rng)
        .questions
}

/// Attempted bank questions that are due or struggling.
///
/// Counts exactly the first two review tiers; recovering questions are not
/// included.
#[must_use]
pub fn review_count(bank: &QuestionBank, progress: &UserProgress, today: NaiveDate) -> usize {
    progress
        .attempted()
        .filter(|(id, _)| bank.contains(id))
        .filter(|(_, stat)| stat.is_due(today) || stat.is_struggling())
        .count()
}
