//! Persistence contracts for progress, stats and the session log.
//!
//! Writes use optimistic concurrency: every stored record carries a
//! `version`, and an upsert only succeeds when the caller's
//! `expected_version` matches the stored one (`None` means "no row yet").
//! A mismatch is reported as [`StoreError::Conflict`] and nothing is written.
//! A submission writes its progress and stats rows through
//! [`ProgressStore::commit_review`], which applies both or neither.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingo_algo::{AlgoError, ItemProgress, StudySessionRecord, UserLearningStats};

pub use memory::{InMemoryProgressStore, InMemorySessionLog};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict")]
    Conflict,
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<AlgoError> for StoreError {
    fn from(err: AlgoError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get(&self, user_id: &str, item_id: &str)
        -> Result<Option<ItemProgress>, StoreError>;

    /// All records of a user, ordered by item id
    async fn list(&self, user_id: &str) -> Result<Vec<ItemProgress>, StoreError>;

    /// Records with `nextReviewDate <= as_of`, earliest due first
    async fn list_due(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ItemProgress>, StoreError>;

    /// Compare-and-swap write; returns the stored record with its new version.
    async fn upsert(
        &self,
        progress: ItemProgress,
        expected_version: Option<i64>,
    ) -> Result<ItemProgress, StoreError>;

    /// Number of distinct items the user has reviewed at least once
    async fn count_reviewed(&self, user_id: &str) -> Result<u64, StoreError>;

    async fn get_stats(&self, user_id: &str) -> Result<Option<UserLearningStats>, StoreError>;

    async fn upsert_stats(
        &self,
        stats: UserLearningStats,
        expected_version: Option<i64>,
    ) -> Result<UserLearningStats, StoreError>;

    /// Both CAS writes of a [`ReviewCommit`], or neither.
    async fn commit_review(
        &self,
        commit: ReviewCommit,
    ) -> Result<(ItemProgress, UserLearningStats), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Rows written by one answer, each with the version it replaces.
#[derive(Debug, Clone)]
pub struct ReviewCommit {
    pub progress: ItemProgress,
    pub expected_progress_version: Option<i64>,
    pub stats: UserLearningStats,
    pub expected_stats_version: Option<i64>,
}

/// Capped append-only log of answer events.
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    async fn append(&self, record: StudySessionRecord) -> Result<(), StoreError>;

    /// Newest first
    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StudySessionRecord>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}

/// Version a successful CAS write stores.
pub(crate) fn next_version(
    stored: Option<i64>,
    expected: Option<i64>,
) -> Result<i64, StoreError> {
    if stored != expected {
        return Err(StoreError::Conflict);
    }
    Ok(expected.unwrap_or(0) + 1)
}
