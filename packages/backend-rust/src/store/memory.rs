use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingo_algo::sanitize::{validate_progress, validate_stats};
use lingo_algo::{ItemProgress, StudySessionRecord, UserLearningStats};
use parking_lot::{Mutex, RwLock};

use super::{next_version, ProgressStore, ReviewCommit, SessionRecorder, StoreError};

#[derive(Default)]
struct Tables {
    /// user id -> item id -> record
    progress: HashMap<String, BTreeMap<String, ItemProgress>>,
    stats: HashMap<String, UserLearningStats>,
}

/// Process-local store, used by default and in tests.
#[derive(Default)]
pub struct InMemoryProgressStore {
    tables: RwLock<Tables>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<Option<ItemProgress>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .progress
            .get(user_id)
            .and_then(|items| items.get(item_id))
            .cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ItemProgress>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .progress
            .get(user_id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_due(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ItemProgress>, StoreError> {
        let mut due: Vec<ItemProgress> = {
            let tables = self.tables.read();
            tables
                .progress
                .get(user_id)
                .map(|items| {
                    items
                        .values()
                        .filter(|item| item.is_due(as_of))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        // BTreeMap iteration is already by item id, the stable sort keeps it for ties
        due.sort_by_key(|item| item.next_review_date);
        Ok(due)
    }

    async fn upsert(
        &self,
        mut progress: ItemProgress,
        expected_version: Option<i64>,
    ) -> Result<ItemProgress, StoreError> {
        validate_progress(&progress)?;

        let mut tables = self.tables.write();
        let items = tables.progress.entry(progress.user_id.clone()).or_default();
        let stored = items.get(&progress.item_id).map(|item| item.version);
        progress.version = next_version(stored, expected_version)?;
        items.insert(progress.item_id.clone(), progress.clone());
        Ok(progress)
    }

    async fn count_reviewed(&self, user_id: &str) -> Result<u64, StoreError> {
        let tables = self.tables.read();
        let count = tables
            .progress
            .get(user_id)
            .map(|items| items.values().filter(|item| item.total_reviews > 0).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn get_stats(&self, user_id: &str) -> Result<Option<UserLearningStats>, StoreError> {
        Ok(self.tables.read().stats.get(user_id).cloned())
    }

    async fn upsert_stats(
        &self,
        mut stats: UserLearningStats,
        expected_version: Option<i64>,
    ) -> Result<UserLearningStats, StoreError> {
        validate_stats(&stats)?;

        let mut tables = self.tables.write();
        let stored = tables.stats.get(&stats.user_id).map(|row| row.version);
        stats.version = next_version(stored, expected_version)?;
        tables.stats.insert(stats.user_id.clone(), stats.clone());
        Ok(stats)
    }

    async fn commit_review(
        &self,
        commit: ReviewCommit,
    ) -> Result<(ItemProgress, UserLearningStats), StoreError> {
        let ReviewCommit {
            mut progress,
            expected_progress_version,
            mut stats,
            expected_stats_version,
        } = commit;
        validate_progress(&progress)?;
        validate_stats(&stats)?;

        // both versions are checked before either row changes
        let mut tables = self.tables.write();
        let stored_progress = tables
            .progress
            .get(&progress.user_id)
            .and_then(|items| items.get(&progress.item_id))
            .map(|item| item.version);
        let stored_stats = tables.stats.get(&stats.user_id).map(|row| row.version);
        progress.version = next_version(stored_progress, expected_progress_version)?;
        stats.version = next_version(stored_stats, expected_stats_version)?;

        tables
            .progress
            .entry(progress.user_id.clone())
            .or_default()
            .insert(progress.item_id.clone(), progress.clone());
        tables.stats.insert(stats.user_id.clone(), stats.clone());
        Ok((progress, stats))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Ring buffer of the most recent answer events across all users.
pub struct InMemorySessionLog {
    capacity: usize,
    records: Mutex<VecDeque<StudySessionRecord>>,
}

impl InMemorySessionLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }
}

#[async_trait]
impl SessionRecorder for InMemorySessionLog {
    async fn append(&self, record: StudySessionRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StudySessionRecord>, StoreError> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .rev()
            .filter(|record| record.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().len())
    }
}
