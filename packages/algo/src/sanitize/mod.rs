//! Data Sanitization
//!
//! Range checks applied to records before they are persisted.
//!
//! Functions:
//! - Identifier validation
//! - Progress record validation
//! - Stats record validation

use crate::mastery::classify;
use crate::types::{
    ItemProgress, UserLearningStats, INITIAL_INTERVAL_DAYS, MAX_INTERVAL_DAYS, MAX_QUALITY,
    MIN_EASINESS,
};
use crate::AlgoError;

/// Longest accepted user or item id
pub const MAX_ID_LEN: usize = 128;

/// Trim an identifier and reject blank or oversized values.
pub fn normalize_id(field: &str, raw: &str) -> Result<String, AlgoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AlgoError::InvalidRecord(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_ID_LEN {
        return Err(AlgoError::InvalidRecord(format!(
            "{field} exceeds maximum length of {MAX_ID_LEN}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Check an [`ItemProgress`] against the data-model ranges.
pub fn validate_progress(progress: &ItemProgress) -> Result<(), AlgoError> {
    normalize_id("userId", &progress.user_id)?;
    normalize_id("itemId", &progress.item_id)?;

    if !progress.easiness_factor.is_finite() || progress.easiness_factor < MIN_EASINESS {
        return Err(invalid(format!(
            "easinessFactor must be a finite number >= {MIN_EASINESS}, got {}",
            progress.easiness_factor
        )));
    }
    if !(INITIAL_INTERVAL_DAYS..=MAX_INTERVAL_DAYS).contains(&progress.interval_days) {
        return Err(invalid(format!(
            "intervalDays must be between {INITIAL_INTERVAL_DAYS} and {MAX_INTERVAL_DAYS}, got {}",
            progress.interval_days
        )));
    }
    if progress.last_quality > MAX_QUALITY {
        return Err(invalid(format!(
            "lastQuality must be <= {MAX_QUALITY}, got {}",
            progress.last_quality
        )));
    }
    if progress.correct_reviews > progress.total_reviews {
        return Err(invalid(format!(
            "correctReviews ({}) exceeds totalReviews ({})",
            progress.correct_reviews, progress.total_reviews
        )));
    }
    if progress.mastery_level != classify(progress) {
        return Err(invalid(format!(
            "masteryLevel {} does not match counters",
            progress.mastery_level.as_str()
        )));
    }
    if progress.version < 0 {
        return Err(invalid("version must not be negative".to_string()));
    }
    Ok(())
}

pub fn validate_stats(stats: &UserLearningStats) -> Result<(), AlgoError> {
    normalize_id("userId", &stats.user_id)?;
    if stats.current_level == 0 {
        return Err(invalid("currentLevel starts at 1".to_string()));
    }
    if stats.version < 0 {
        return Err(invalid("version must not be negative".to_string()));
    }
    Ok(())
}

fn invalid(message: String) -> AlgoError {
    AlgoError::InvalidRecord(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm2::schedule;
    use crate::types::{ItemKind, Quality};
    use chrono::Utc;

    fn scheduled() -> ItemProgress {
        let now = Utc::now();
        let item = ItemProgress::new("u1", "w1", ItemKind::Word, now);
        schedule(&item, Quality::new(4).unwrap(), now)
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("itemId", "  apple ").unwrap(), "apple");
        assert!(normalize_id("itemId", "   ").is_err());
        assert!(normalize_id("itemId", &"x".repeat(MAX_ID_LEN + 1)).is_err());
        assert!(normalize_id("itemId", &"x".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn test_scheduled_record_is_valid() {
        assert!(validate_progress(&scheduled()).is_ok());
    }

    #[test]
    fn test_rejects_low_easiness() {
        let mut item = scheduled();
        item.easiness_factor = 1.2;
        assert!(validate_progress(&item).is_err());
        item.easiness_factor = f64::NAN;
        assert!(validate_progress(&item).is_err());
        item.easiness_factor = f64::INFINITY;
        assert!(validate_progress(&item).is_err());
    }

    #[test]
    fn test_rejects_counter_inversion() {
        let mut item = scheduled();
        item.correct_reviews = item.total_reviews + 1;
        assert!(validate_progress(&item).is_err());
    }

    #[test]
    fn test_rejects_stale_mastery_level() {
        let mut item = scheduled();
        item.mastery_level = crate::types::MasteryLevel::Mastered;
        assert!(validate_progress(&item).is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut item = scheduled();
        item.interval_days = 0;
        assert!(validate_progress(&item).is_err());
    }

    #[test]
    fn test_validate_stats() {
        let stats = UserLearningStats::new("u1", 20);
        assert!(validate_stats(&stats).is_ok());
        let broken = UserLearningStats {
            current_level: 0,
            ..stats
        };
        assert!(validate_stats(&broken).is_err());
    }
}
