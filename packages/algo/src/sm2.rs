//! SM-2 scheduler
//!
//! Maps the current scheduling state of an item and an answer quality onto
//! the next state. The easiness factor is recomputed on every answer,
//! including failed ones, and never drops below [`MIN_EASINESS`].

use chrono::{DateTime, Duration, Utc};

use crate::mastery::classify;
use crate::types::{
    ItemProgress, Quality, INITIAL_INTERVAL_DAYS, MAX_INTERVAL_DAYS, MAX_QUALITY, MIN_EASINESS,
    SECOND_INTERVAL_DAYS,
};

/// Apply one review to `current` and return the updated record.
///
/// `now` is the review instant; the next review is due `intervalDays` after it.
pub fn schedule(current: &ItemProgress, quality: Quality, now: DateTime<Utc>) -> ItemProgress {
    let mut next = current.clone();

    if quality.is_pass() {
        next.interval_days = match current.repetitions {
            0 => INITIAL_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => grow_interval(current.interval_days, current.easiness_factor),
        };
        next.repetitions = current.repetitions.saturating_add(1);
        next.correct_reviews = current.correct_reviews.saturating_add(1);
    } else {
        next.repetitions = 0;
        next.interval_days = INITIAL_INTERVAL_DAYS;
    }

    next.easiness_factor = next_easiness(current.easiness_factor, quality);
    next.total_reviews = current.total_reviews.saturating_add(1);
    next.last_quality = quality.value();
    next.next_review_date = now + Duration::days(next.interval_days);
    next.last_review_date = Some(now);
    next.updated_at = now;
    next.mastery_level = classify(&next);

    next
}

/// `EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`, floored at 1.3
pub fn next_easiness(easiness: f64, quality: Quality) -> f64 {
    let miss = (MAX_QUALITY - quality.value()) as f64;
    let updated = easiness + (0.1 - miss * (0.08 + miss * 0.02));
    updated.max(MIN_EASINESS)
}

fn grow_interval(interval_days: i64, easiness: f64) -> i64 {
    let grown = (interval_days as f64 * easiness).round();
    grown.clamp(INITIAL_INTERVAL_DAYS as f64, MAX_INTERVAL_DAYS as f64) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, MasteryLevel, INITIAL_EASINESS};

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn fresh(now: DateTime<Utc>) -> ItemProgress {
        ItemProgress::new("u1", "w1", ItemKind::Word, now)
    }

    #[test]
    fn test_first_perfect_answer() {
        let now = Utc::now();
        let next = schedule(&fresh(now), q(5), now);

        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 1);
        assert!(next.easiness_factor > INITIAL_EASINESS);
        assert_eq!(next.mastery_level, MasteryLevel::Learning);
        assert_eq!(next.total_reviews, 1);
        assert_eq!(next.correct_reviews, 1);
        assert_eq!(next.next_review_date, now + Duration::days(1));
        assert_eq!(next.last_review_date, Some(now));
    }

    #[test]
    fn test_three_good_answers_grow_interval() {
        let now = Utc::now();
        let first = schedule(&fresh(now), q(4), now);
        let second = schedule(&first, q(4), now);
        let third = schedule(&second, q(4), now);

        assert_eq!(first.interval_days, 1);
        assert_eq!(second.interval_days, 6);
        let expected = (6.0 * second.easiness_factor).round() as i64;
        assert_eq!(third.interval_days, expected);
        assert_eq!(third.interval_days, 15);
        assert_eq!(third.repetitions, 3);
    }

    #[test]
    fn test_quality_four_keeps_easiness() {
        assert!((next_easiness(2.5, q(4)) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_failure_resets_but_still_adjusts_easiness() {
        let now = Utc::now();
        let mut item = fresh(now);
        item.repetitions = 5;
        item.interval_days = 20;
        item.easiness_factor = 2.0;
        item.total_reviews = 5;
        item.correct_reviews = 5;

        let next = schedule(&item, q(2), now);

        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval_days, 1);
        assert!((next.easiness_factor - 1.68).abs() < 1e-9);
        assert_eq!(next.total_reviews, 6);
        assert_eq!(next.correct_reviews, 5);
        assert_eq!(next.mastery_level, MasteryLevel::Learning);
    }

    #[test]
    fn test_easiness_floor() {
        assert_eq!(next_easiness(1.3, q(0)), MIN_EASINESS);
        assert_eq!(next_easiness(1.5, q(1)), MIN_EASINESS);
    }

    #[test]
    fn test_schedule_does_not_touch_input() {
        let now = Utc::now();
        let item = fresh(now);
        let snapshot = item.clone();
        let _ = schedule(&item, q(3), now + Duration::hours(3));
        assert_eq!(item, snapshot);
    }

    #[test]
    fn test_interval_is_capped() {
        let now = Utc::now();
        let mut item = fresh(now);
        item.repetitions = 9;
        item.interval_days = 30_000;
        item.total_reviews = 9;
        item.correct_reviews = 9;
        let next = schedule(&item, q(5), now);
        assert_eq!(next.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_mastered_after_long_streak() {
        let now = Utc::now();
        let mut item = fresh(now);
        for _ in 0..3 {
            item = schedule(&item, q(5), now);
        }
        assert_eq!(item.interval_days, 16);
        assert_eq!(item.mastery_level, MasteryLevel::Mastered);
    }
}
