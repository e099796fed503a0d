use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use lingo_algo::quality::{from_confidence, from_performance};
use lingo_algo::sanitize::normalize_id;
use lingo_algo::{
    prioritize, schedule, AlgoError, Confidence, ItemKind, ItemProgress, PrioritizedItem, Quality,
    SessionType, StudySessionRecord, UserLearningStats,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::services::plan::{build_plan, StudyPlan};
use crate::services::stats::{LearningOverview, StatsAggregator};
use crate::store::{ProgressStore, ReviewCommit, SessionRecorder, StoreError};

pub const DEFAULT_STUDY_MINUTES: u32 = 1;
pub const MAX_STUDY_MINUTES: u32 = 240;
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;
pub const MAX_ACTIVITY_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 1000;
pub const MAX_PLAN_CANDIDATES: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("concurrent updates on {0}, retries exhausted")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// A stored or computed record failed the store's checks
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<AlgoError> for ReviewError {
    fn from(err: AlgoError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict("record".to_string()),
            StoreError::Invalid(message) => Self::Corrupt(message),
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
        }
    }
}

/// Answer event as posted by a client.
///
/// Either `quality` or `isCorrect` must be present; without `quality` it is
/// derived from `isCorrect` plus `confidence`, or plus response time and hints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReview {
    pub item_id: String,
    #[serde(default)]
    pub quality: Option<i64>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub hints_used: Option<u32>,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub item_kind: Option<String>,
    #[serde(default)]
    pub study_time_minutes: Option<u32>,
    /// Learner's calendar day, `YYYY-MM-DD`
    #[serde(default)]
    pub local_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub item_progress: ItemProgress,
    pub user_stats: UserLearningStats,
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewSettings {
    pub max_retries: u32,
    pub default_daily_goal: u32,
    pub study_day_offset_minutes: i32,
}

impl From<&Config> for ReviewSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_retries: config.submit_max_retries,
            default_daily_goal: config.default_daily_goal,
            study_day_offset_minutes: config.study_day_offset_minutes,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Validated form of [`SubmitReview`]
struct ReviewInput {
    user_id: String,
    item_id: String,
    item_kind: ItemKind,
    quality: Quality,
    session_type: SessionType,
    session_id: String,
    study_minutes: u32,
    today: NaiveDate,
}

pub struct ReviewService {
    store: Arc<dyn ProgressStore>,
    recorder: Arc<dyn SessionRecorder>,
    stats: StatsAggregator,
    settings: ReviewSettings,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        recorder: Arc<dyn SessionRecorder>,
        settings: ReviewSettings,
    ) -> Self {
        let stats = StatsAggregator::new(Arc::clone(&store), settings.default_daily_goal);
        Self {
            store,
            recorder,
            stats,
            settings,
        }
    }

    /// Schedule one answer, persist it together with the learner's stats and log the event.
    ///
    /// The progress and stats rows are committed as one unit; a failed
    /// submission leaves both untouched.
    pub async fn submit_review(
        &self,
        user_id: &str,
        request: SubmitReview,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, ReviewError> {
        let input = self.validate(user_id, request, now)?;
        // stored timestamps keep millisecond precision
        let now = now.trunc_subsecs(3);

        let (item_progress, user_stats) = self.commit_answer(&input, now).await?;

        let record = StudySessionRecord {
            session_id: input.session_id,
            user_id: input.user_id,
            item_id: input.item_id,
            timestamp: now,
            quality: input.quality.value(),
            is_correct: input.quality.is_pass(),
            session_type: input.session_type,
        };
        if let Err(err) = self.recorder.append(record).await {
            tracing::warn!(
                error = %err,
                user_id = %item_progress.user_id,
                item_id = %item_progress.item_id,
                "session record append failed"
            );
        }

        tracing::info!(
            user_id = %item_progress.user_id,
            item_id = %item_progress.item_id,
            quality = input.quality.value(),
            interval_days = item_progress.interval_days,
            mastery = item_progress.mastery_level.as_str(),
            "review scheduled"
        );

        Ok(SubmitOutcome {
            item_progress,
            user_stats,
        })
    }

    async fn commit_answer(
        &self,
        input: &ReviewInput,
        now: DateTime<Utc>,
    ) -> Result<(ItemProgress, UserLearningStats), ReviewError> {
        for attempt in 0..=self.settings.max_retries {
            let stored = self.store.get(&input.user_id, &input.item_id).await?;
            let expected_progress_version = stored.as_ref().map(|progress| progress.version);
            let current = stored.unwrap_or_else(|| {
                ItemProgress::new(&input.user_id, &input.item_id, input.item_kind, now)
            });

            let progress = schedule(&current, input.quality, now);
            let pending = self
                .stats
                .prepare_submission(
                    &input.user_id,
                    current.total_reviews == 0,
                    input.study_minutes,
                    input.today,
                    now,
                )
                .await?;

            let commit = ReviewCommit {
                progress,
                expected_progress_version,
                stats: pending.stats,
                expected_stats_version: pending.expected_version,
            };
            match self.store.commit_review(commit).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::Conflict) => {
                    tracing::debug!(
                        user_id = %input.user_id,
                        item_id = %input.item_id,
                        attempt,
                        "review commit version conflict, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(
            user_id = %input.user_id,
            item_id = %input.item_id,
            retries = self.settings.max_retries,
            "review commit gave up after repeated conflicts"
        );
        Err(ReviewError::Conflict(format!(
            "{}/{}",
            input.user_id, input.item_id
        )))
    }

    fn validate(
        &self,
        user_id: &str,
        request: SubmitReview,
        now: DateTime<Utc>,
    ) -> Result<ReviewInput, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        let item_id = normalize_id("itemId", &request.item_id)?;
        let quality = resolve_quality(&request)?;

        let session_type = match request.session_type.as_deref() {
            None => SessionType::default(),
            Some(raw) => SessionType::parse(raw).ok_or_else(|| {
                ReviewError::Validation(format!(
                    "sessionType must be one of new_words, review, practice, got {raw}"
                ))
            })?,
        };

        let item_kind = match request.item_kind.as_deref() {
            None => ItemKind::default(),
            Some(raw) => ItemKind::parse(raw).ok_or_else(|| {
                ReviewError::Validation(format!("itemKind must be word or sentence, got {raw}"))
            })?,
        };

        let session_id = match request.session_id.as_deref() {
            Some(raw) => normalize_id("sessionId", raw)?,
            None => Uuid::new_v4().to_string(),
        };

        let study_minutes = request.study_time_minutes.unwrap_or(DEFAULT_STUDY_MINUTES);
        if study_minutes > MAX_STUDY_MINUTES {
            return Err(ReviewError::Validation(format!(
                "studyTimeMinutes must be between 0 and {MAX_STUDY_MINUTES}"
            )));
        }

        let today = match request.local_date.as_deref() {
            Some(raw) => parse_local_date(raw)?,
            None => study_day(now, self.settings.study_day_offset_minutes),
        };

        Ok(ReviewInput {
            user_id,
            item_id,
            item_kind,
            quality,
            session_type,
            session_id,
            study_minutes,
            today,
        })
    }

    pub async fn get_progress(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<ItemProgress, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        let item_id = normalize_id("itemId", item_id)?;
        self.store
            .get(&user_id, &item_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(format!("no progress for item {item_id}")))
    }

    pub async fn list_progress(
        &self,
        user_id: &str,
        kind: Option<ItemKind>,
    ) -> Result<Vec<ItemProgress>, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        let mut items = self.store.list(&user_id).await?;
        if let Some(kind) = kind {
            items.retain(|item| item.item_kind == kind);
        }
        Ok(items)
    }

    pub async fn due_for_review(
        &self,
        user_id: &str,
        limit: Option<usize>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PrioritizedItem>, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        if let Some(limit) = limit {
            check_limit("limit", limit, MAX_LIST_LIMIT)?;
        }
        let due = self.store.list_due(&user_id, as_of).await?;
        Ok(prioritize(due, as_of, limit))
    }

    pub async fn recent_activity(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StudySessionRecord>, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
        check_limit("limit", limit, MAX_ACTIVITY_LIMIT)?;
        Ok(self.recorder.recent(&user_id, limit).await?)
    }

    pub async fn overview(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<LearningOverview, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        Ok(self.stats.overview(&user_id, as_of).await?)
    }

    /// Today's plan: due reviews first, then unseen candidates, `limit`
    /// defaulting to the learner's daily goal.
    pub async fn study_plan(
        &self,
        user_id: &str,
        candidate_ids: &[String],
        limit: Option<usize>,
        as_of: DateTime<Utc>,
    ) -> Result<StudyPlan, ReviewError> {
        let user_id = normalize_id("userId", user_id)?;
        if candidate_ids.len() > MAX_PLAN_CANDIDATES {
            return Err(ReviewError::Validation(format!(
                "candidateItemIds exceeds maximum size of {MAX_PLAN_CANDIDATES}"
            )));
        }
        let candidates = candidate_ids
            .iter()
            .map(|id| normalize_id("candidateItemIds", id))
            .collect::<Result<Vec<_>, _>>()?;

        let limit = match limit {
            Some(limit) => {
                check_limit("limit", limit, MAX_LIST_LIMIT)?;
                limit
            }
            None => self.stats.current(&user_id).await?.daily_goal as usize,
        };

        let items = self.store.list(&user_id).await?;
        Ok(build_plan(items, &candidates, limit, as_of))
    }

    pub async fn ping(&self) -> Result<(), ReviewError> {
        Ok(self.store.ping().await?)
    }
}

fn resolve_quality(request: &SubmitReview) -> Result<Quality, ReviewError> {
    match (request.quality, request.is_correct) {
        (Some(raw), is_correct) => {
            let quality = Quality::new(raw)?;
            if let Some(is_correct) = is_correct {
                if is_correct != quality.is_pass() {
                    return Err(ReviewError::Validation(format!(
                        "isCorrect={is_correct} contradicts quality {raw}"
                    )));
                }
            }
            Ok(quality)
        }
        (None, Some(is_correct)) => Ok(match request.confidence {
            Some(confidence) => from_confidence(is_correct, confidence),
            None => from_performance(
                is_correct,
                request.response_time_ms,
                request.hints_used.unwrap_or(0),
            ),
        }),
        (None, None) => Err(ReviewError::Validation(
            "quality or isCorrect is required".to_string(),
        )),
    }
}

fn check_limit(field: &str, value: usize, max: usize) -> Result<(), ReviewError> {
    if value == 0 || value > max {
        return Err(ReviewError::Validation(format!(
            "{field} must be between 1 and {max}"
        )));
    }
    Ok(())
}

pub fn parse_local_date(raw: &str) -> Result<NaiveDate, ReviewError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ReviewError::Validation(format!("localDate must be YYYY-MM-DD, got {raw}"))
    })
}

/// Calendar day of `now` at the given UTC offset.
pub fn study_day(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(i64::from(offset_minutes))).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(quality: Option<i64>, is_correct: Option<bool>) -> SubmitReview {
        SubmitReview {
            item_id: "apple".to_string(),
            quality,
            is_correct,
            ..SubmitReview::default()
        }
    }

    #[test]
    fn test_resolve_quality() {
        assert_eq!(resolve_quality(&request(Some(4), None)).unwrap().value(), 4);
        assert_eq!(resolve_quality(&request(Some(2), Some(false))).unwrap().value(), 2);
        assert!(resolve_quality(&request(Some(7), None)).is_err());
        assert!(resolve_quality(&request(Some(5), Some(false))).is_err());
        assert!(resolve_quality(&request(None, None)).is_err());
        assert_eq!(resolve_quality(&request(None, Some(true))).unwrap().value(), 5);
        assert_eq!(resolve_quality(&request(None, Some(false))).unwrap().value(), 2);

        let slow_with_hint = SubmitReview {
            response_time_ms: Some(40_000),
            hints_used: Some(1),
            ..request(None, Some(true))
        };
        assert_eq!(resolve_quality(&slow_with_hint).unwrap().value(), 3);

        let unsure = SubmitReview {
            confidence: Some(Confidence::Low),
            ..request(None, Some(true))
        };
        assert_eq!(resolve_quality(&unsure).unwrap().value(), 3);
    }

    #[test]
    fn test_study_day_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(study_day(now, 0), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(study_day(now, 120), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(study_day(now, -720), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_local_date() {
        assert_eq!(
            parse_local_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_local_date("2023-02-29").is_err());
        assert!(parse_local_date("yesterday").is_err());
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit("limit", 1, 10).is_ok());
        assert!(check_limit("limit", 10, 10).is_ok());
        assert!(check_limit("limit", 0, 10).is_err());
        assert!(check_limit("limit", 11, 10).is_err());
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(ReviewError::from(StoreError::Conflict), ReviewError::Conflict(_)));
        assert!(matches!(
            ReviewError::from(StoreError::Invalid("x".into())),
            ReviewError::Corrupt(_)
        ));
        assert!(matches!(
            ReviewError::from(StoreError::Unavailable("down".into())),
            ReviewError::StoreUnavailable(_)
        ));
    }
}
