use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use lingo_algo::{
    apply_study_event, ItemProgress, MasteryDistribution, MasteryLevel, StudyEvent,
    UserLearningStats, INITIAL_EASINESS,
};
use serde::Serialize;

use crate::store::{ProgressStore, StoreError};

/// Stats row one submission will write, with the version it replaces.
#[derive(Debug, Clone)]
pub struct PendingStats {
    pub stats: UserLearningStats,
    pub expected_version: Option<i64>,
}

/// Keeps the per-user summary row in step with submissions.
pub struct StatsAggregator {
    store: Arc<dyn ProgressStore>,
    default_daily_goal: u32,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn ProgressStore>, default_daily_goal: u32) -> Self {
        Self {
            store,
            default_daily_goal,
        }
    }

    /// Stored stats, or the defaults for a learner who never submitted.
    pub async fn current(&self, user_id: &str) -> Result<UserLearningStats, StoreError> {
        Ok(self
            .store
            .get_stats(user_id)
            .await?
            .unwrap_or_else(|| UserLearningStats::new(user_id, self.default_daily_goal)))
    }

    /// Stats after one more submission, to be committed with its progress row.
    ///
    /// `first_review` marks an item the user had not reviewed before. Every
    /// committed answer bumps the stats version, so a reviewed-item count that
    /// went stale between these reads makes the commit conflict.
    pub async fn prepare_submission(
        &self,
        user_id: &str,
        first_review: bool,
        study_minutes: u32,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<PendingStats, StoreError> {
        let stored = self.store.get_stats(user_id).await?;
        let expected_version = stored.as_ref().map(|stats| stats.version);
        let base =
            stored.unwrap_or_else(|| UserLearningStats::new(user_id, self.default_daily_goal));
        let distinct_items_reviewed =
            self.store.count_reviewed(user_id).await? + u64::from(first_review);

        let stats = apply_study_event(
            &base,
            StudyEvent {
                distinct_items_reviewed,
                study_minutes,
                today,
                now,
            },
        );
        Ok(PendingStats {
            stats,
            expected_version,
        })
    }

    pub async fn overview(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<LearningOverview, StoreError> {
        let user_stats = self.current(user_id).await?;
        let items = self.store.list(user_id).await?;
        Ok(LearningOverview::from_items(user_stats, &items, as_of))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningOverview {
    pub user_stats: UserLearningStats,
    pub total: u64,
    pub new: u64,
    pub learning: u64,
    pub mastered: u64,
    pub due: u64,
    /// Mean easiness over items reviewed successfully at least once
    pub average_easiness: f64,
    /// Share of mastered items, in percent
    pub mastery_rate: u32,
    pub mastery_distribution: MasteryDistribution,
}

impl LearningOverview {
    pub fn from_items(
        user_stats: UserLearningStats,
        items: &[ItemProgress],
        as_of: DateTime<Utc>,
    ) -> Self {
        let count = |level: MasteryLevel| {
            items.iter().filter(|item| item.mastery_level == level).count() as u64
        };
        let total = items.len() as u64;
        let mastered = count(MasteryLevel::Mastered);

        let practiced: Vec<f64> = items
            .iter()
            .filter(|item| item.repetitions > 0)
            .map(|item| item.easiness_factor)
            .collect();
        let average_easiness = if practiced.is_empty() {
            INITIAL_EASINESS
        } else {
            let mean = practiced.iter().sum::<f64>() / practiced.len() as f64;
            (mean * 100.0).round() / 100.0
        };

        let mastery_rate = if total == 0 {
            0
        } else {
            ((mastered as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            user_stats,
            total,
            new: count(MasteryLevel::New),
            learning: count(MasteryLevel::Learning),
            mastered,
            due: items.iter().filter(|item| item.is_due(as_of)).count() as u64,
            average_easiness,
            mastery_rate,
            mastery_distribution: MasteryDistribution::from_items(items),
        }
    }
}
