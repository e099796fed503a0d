//! Property-Based Tests for the scheduling core
//!
//! Tests the following invariants:
//! - Easiness floor: easinessFactor never drops below 1.3
//! - Failure reset: qualities 0-2 always yield repetitions 0 and interval 1
//! - Counter consistency: correctReviews <= totalReviews, both grow by the rules
//! - Classification: mastery level always matches the counters
//! - Prioritization determinism: identical input gives identical order

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use lingo_algo::sanitize::validate_progress;
use lingo_algo::{
    classify, prioritize, schedule, ItemKind, ItemProgress, MasteryLevel, Quality, MIN_EASINESS,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

fn arb_quality() -> impl Strategy<Value = Quality> {
    (0i64..=5i64).prop_map(|v| Quality::new(v).unwrap())
}

fn arb_failing_quality() -> impl Strategy<Value = Quality> {
    (0i64..=2i64).prop_map(|v| Quality::new(v).unwrap())
}

fn arb_progress() -> impl Strategy<Value = ItemProgress> {
    (
        (130u32..=400u32),    // easiness x100
        (0u32..=20u32),       // repetitions
        (1i64..=400i64),      // interval
        (0u32..=50u32),       // total
        (0u32..=100u32),      // correct share in percent
        (-30i64..=30i64),     // due offset in days
    )
        .prop_map(|(ef, repetitions, interval, total, pct, offset)| {
            let mut item = ItemProgress::new("u", "i", ItemKind::Word, base_time());
            item.easiness_factor = ef as f64 / 100.0;
            item.repetitions = repetitions;
            item.interval_days = interval;
            item.total_reviews = total;
            item.correct_reviews = total * pct / 100;
            item.next_review_date = base_time() + Duration::days(offset);
            item.mastery_level = classify(&item);
            item
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_easiness_never_below_floor(
        qualities in prop::collection::vec(arb_quality(), 1..60)
    ) {
        let mut item = ItemProgress::new("u", "i", ItemKind::Word, base_time());
        for (day, quality) in qualities.into_iter().enumerate() {
            item = schedule(&item, quality, base_time() + Duration::days(day as i64));
            prop_assert!(item.easiness_factor >= MIN_EASINESS);
            prop_assert!(item.interval_days >= 1);
        }
    }

    #[test]
    fn prop_failure_resets(item in arb_progress(), quality in arb_failing_quality()) {
        let next = schedule(&item, quality, base_time());
        prop_assert_eq!(next.repetitions, 0);
        prop_assert_eq!(next.interval_days, 1);
        prop_assert_eq!(next.correct_reviews, item.correct_reviews);
        prop_assert!(next.mastery_level != MasteryLevel::Mastered);
    }

    #[test]
    fn prop_counters_stay_consistent(
        item in arb_progress(),
        qualities in prop::collection::vec(arb_quality(), 1..20)
    ) {
        let mut current = item;
        for quality in qualities {
            let next = schedule(&current, quality, base_time());
            prop_assert_eq!(next.total_reviews, current.total_reviews + 1);
            prop_assert!(next.correct_reviews <= next.total_reviews);
            prop_assert!(next.correct_reviews >= current.correct_reviews);
            prop_assert_eq!(next.mastery_level, classify(&next));
            prop_assert!(validate_progress(&next).is_ok());
            prop_assert_eq!(next.next_review_date, base_time() + Duration::days(next.interval_days));
            current = next;
        }
    }

    #[test]
    fn prop_prioritize_is_deterministic(
        items in prop::collection::vec(arb_progress(), 0..30),
        limit in proptest::option::of(0usize..40)
    ) {
        let first = prioritize(items.clone(), base_time(), limit);
        let second = prioritize(items.clone(), base_time(), limit);
        prop_assert_eq!(&first, &second);

        for ranked in &first {
            prop_assert!(ranked.item_progress.next_review_date <= base_time());
            prop_assert!(ranked.priority_score >= 0.0);
        }
        for pair in first.windows(2) {
            prop_assert!(pair[0].priority_score >= pair[1].priority_score);
        }
        if let Some(limit) = limit {
            prop_assert!(first.len() <= limit);
        }
    }
}
