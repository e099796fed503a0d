//! User-level learning statistics: level and daily streak.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{UserLearningStats, WORDS_PER_LEVEL};

/// `floor(totalWordsLearned / 100) + 1`
pub fn level_for(total_words_learned: u64) -> u32 {
    let level = total_words_learned / WORDS_PER_LEVEL + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Streak after studying on `today`, given the previous study date.
///
/// Same day keeps the streak, the day after extends it, anything else
/// (first study, a gap, or a previous date later than `today`) restarts at 1.
pub fn next_streak(streak_days: u32, last_study_date: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_study_date {
        Some(last) if last == today => streak_days,
        Some(last) if today.pred_opt() == Some(last) => streak_days.saturating_add(1),
        _ => 1,
    }
}

/// Input of one submission to the stats rules
#[derive(Clone, Copy, Debug)]
pub struct StudyEvent {
    /// Distinct items with at least one review, after the submission
    pub distinct_items_reviewed: u64,
    pub study_minutes: u32,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

/// Fold one submission into the user's stats.
pub fn apply_study_event(stats: &UserLearningStats, event: StudyEvent) -> UserLearningStats {
    let mut next = stats.clone();
    next.streak_days = next_streak(stats.streak_days, stats.last_study_date, event.today);
    next.last_study_date = Some(event.today);
    next.total_study_time_minutes = stats
        .total_study_time_minutes
        .saturating_add(event.study_minutes as u64);
    next.total_words_learned = event.distinct_items_reviewed;
    next.current_level = level_for(event.distinct_items_reviewed);
    next.updated_at = Some(event.now);
    next
}
