//! Mastery classification

use serde::{Deserialize, Serialize};

use crate::types::{
    ItemProgress, MasteryLevel, MASTERED_MIN_ACCURACY, MASTERED_MIN_INTERVAL_DAYS,
    MASTERED_MIN_REPETITIONS, MIN_EASINESS,
};

/// Categorical mastery of an item, derived only from its counters.
pub fn classify(progress: &ItemProgress) -> MasteryLevel {
    if progress.total_reviews == 0 {
        return MasteryLevel::New;
    }

    if progress.repetitions >= MASTERED_MIN_REPETITIONS
        && progress.accuracy() >= MASTERED_MIN_ACCURACY
        && progress.interval_days >= MASTERED_MIN_INTERVAL_DAYS
    {
        MasteryLevel::Mastered
    } else {
        MasteryLevel::Learning
    }
}

/// Mastery percentage (0-100): repetitions contribute up to 80, easiness up to 20.
pub fn mastery_percent(repetitions: u32, easiness: f64) -> u32 {
    let from_repetitions = (repetitions.min(4) * 20) as f64;
    let from_easiness = ((easiness - MIN_EASINESS) / (3.0 - MIN_EASINESS)).max(0.0) * 20.0;
    (from_repetitions + from_easiness).round().min(100.0) as u32
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryDistribution {
    /// 0-25%
    pub beginner: u64,
    /// 26-50%
    pub elementary: u64,
    /// 51-75%
    pub intermediate: u64,
    /// 76-100%
    pub advanced: u64,
}

impl MasteryDistribution {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a ItemProgress>) -> Self {
        let mut dist = Self::default();
        for item in items {
            match mastery_percent(item.repetitions, item.easiness_factor) {
                0..=25 => dist.beginner += 1,
                26..=50 => dist.elementary += 1,
                51..=75 => dist.intermediate += 1,
                _ => dist.advanced += 1,
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;
    use chrono::Utc;

    fn item(repetitions: u32, total: u32, correct: u32, interval: i64) -> ItemProgress {
        let mut item = ItemProgress::new("u", "i", ItemKind::Word, Utc::now());
        item.repetitions = repetitions;
        item.total_reviews = total;
        item.correct_reviews = correct;
        item.interval_days = interval;
        item
    }

    #[test]
    fn test_classify_levels() {
        assert_eq!(classify(&item(0, 0, 0, 1)), MasteryLevel::New);
        assert_eq!(classify(&item(0, 1, 0, 1)), MasteryLevel::Learning);
        assert_eq!(classify(&item(3, 5, 4, 7)), MasteryLevel::Mastered);
    }

    #[test]
    fn test_classify_thresholds_are_inclusive_and_required() {
        // accuracy below 0.8
        assert_eq!(classify(&item(3, 5, 3, 10)), MasteryLevel::Learning);
        // interval below 7
        assert_eq!(classify(&item(4, 4, 4, 6)), MasteryLevel::Learning);
        // repetitions below 3
        assert_eq!(classify(&item(2, 2, 2, 30)), MasteryLevel::Learning);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let it = item(3, 10, 9, 15);
        assert_eq!(classify(&it), classify(&it));
    }

    #[test]
    fn test_mastery_percent() {
        assert_eq!(mastery_percent(0, 1.3), 0);
        assert_eq!(mastery_percent(1, 2.5), 34);
        assert_eq!(mastery_percent(10, 3.0), 100);
        assert_eq!(mastery_percent(10, 4.0), 100);
    }

    #[test]
    fn test_distribution_buckets() {
        let mut a = item(0, 1, 0, 1);
        a.easiness_factor = 1.3;
        let mut b = item(2, 2, 2, 6);
        b.easiness_factor = 2.5;
        let mut c = item(5, 5, 5, 30);
        c.easiness_factor = 2.8;

        let dist = MasteryDistribution::from_items([&a, &b, &c]);
        assert_eq!(dist.beginner, 1);
        assert_eq!(dist.intermediate, 1);
        assert_eq!(dist.advanced, 1);
        assert_eq!(dist.elementary, 0);
    }
}
