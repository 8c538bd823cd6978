use chrono::NaiveDate;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

use quiz_core::QuestionBank;
use quiz_core::model::{Mode, QuestionId, QuestionStat, StageId, UserProgress};
use services::{SelectionBuilder, Tier, review_count};

fn bank() -> QuestionBank {
    let records: Vec<String> = StageId::ALL
        .iter()
        .flat_map(|stage| {
            (0..6).map(move |i| {
                format!(
                    r#"{{"id": "{stage}-{i}", "stageId": "{stage}", "difficulty": {d},
                        "body": "Q{i}", "correctChoiceId": "c0",
                        "choices": [{{"id": "c0", "text": "zero"}}, {{"id": "c1", "text": "one"}},
                                    {{"id": "c2", "text": "two"}}, {{"id": "c3", "text": "three"}}]}}"#,
                    d = i % 3 + 1
                )
            })
        })
        .collect();
    QuestionBank::from_json(&format!("[{}]", records.join(","))).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn arb_stat() -> impl Strategy<Value = Option<(u32, u32, Option<i64>)>> {
    prop::option::of((0_u32..6, 0_u32..6, prop::option::of(-5_i64..5)))
}

fn progress_from(bank: &QuestionBank, stats: &[Option<(u32, u32, Option<i64>)>]) -> UserProgress {
    let mut progress = UserProgress::new(today());
    for (question, stat) in bank.iter().zip(stats) {
        if let Some((attempts, correct, offset)) = *stat {
            progress.question_stats.insert(
                question.id().clone(),
                QuestionStat {
                    attempts,
                    correct_count: correct.min(attempts),
                    next_review_date: offset.map(|d| today() + chrono::Duration::days(d)),
                    ..QuestionStat::default()
                },
            );
        }
    }
    progress
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Review),
        (0_usize..StageId::COUNT).prop_map(|i| Mode::Stage(StageId::ALL[i])),
    ]
}

proptest! {
    #[test]
    fn pt_selection_has_no_duplicates_and_respects_count(
        stats in prop::collection::vec(arb_stat(), 30),
        mode in arb_mode(),
        count in 0_usize..40,
        seed in any::<u64>(),
    ) {
        let bank = bank();
        let progress = progress_from(&bank, &stats);
        let mut rng = StdRng::seed_from_u64(seed);

        let plan = SelectionBuilder::new(&bank, &progress, today()).build(mode, count, &mut rng);

        prop_assert!(plan.total() <= count);
        let ids: HashSet<&QuestionId> = plan.questions.iter().map(|q| &q.original_id).collect();
        prop_assert_eq!(ids.len(), plan.total());

        let per_tier: usize = plan.tier_counts.iter().map(|(_, n)| n).sum();
        prop_assert_eq!(per_tier, plan.total());

        for q in &plan.questions {
            let original = bank.get(&q.original_id).unwrap();
            prop_assert_eq!(&q.choices[q.correct_index()].id, original.correct_choice_id());
            if let Mode::Stage(stage) = mode {
                prop_assert_eq!(q.stage_id, stage);
            } else {
                prop_assert!(progress.stat(&q.original_id).is_some_and(QuestionStat::is_attempted));
            }
        }
    }

    #[test]
    fn pt_review_count_matches_first_two_review_tiers(
        stats in prop::collection::vec(arb_stat(), 30),
        seed in any::<u64>(),
    ) {
        let bank = bank();
        let progress = progress_from(&bank, &stats);
        let mut rng = StdRng::seed_from_u64(seed);

        let plan = SelectionBuilder::new(&bank, &progress, today()).build(Mode::Review, usize::MAX, &mut rng);

        prop_assert_eq!(
            review_count(&bank, &progress, today()),
            plan.selected_from(Tier::Due) + plan.selected_from(Tier::Struggling)
        );
    }
}
