use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lingo_algo::sanitize::{validate_progress, validate_stats};
use lingo_algo::{ItemKind, ItemProgress, MasteryLevel, UserLearningStats};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::{from_millis, to_i64, to_millis, to_u32, to_u64};
use crate::store::{ProgressStore, ReviewCommit, StoreError};

const PROGRESS_COLUMNS: &str = r#""userId","itemId","itemKind","easinessFactor","repetitions",
    "intervalDays","nextReviewDate","lastReviewDate","lastQuality","totalReviews",
    "correctReviews","masteryLevel","version","createdAt","updatedAt""#;

const STATS_COLUMNS: &str = r#""userId","totalWordsLearned","totalStudyTimeMinutes","streakDays",
    "lastStudyDate","currentLevel","dailyGoal","version","updatedAt""#;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// [`ProgressStore`] backed by the local SQLite file.
#[derive(Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn get(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> Result<Option<ItemProgress>, StoreError> {
        let sql = format!(
            r#"SELECT {PROGRESS_COLUMNS} FROM "item_progress" WHERE "userId" = ? AND "itemId" = ? LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ItemProgress>, StoreError> {
        let sql = format!(
            r#"SELECT {PROGRESS_COLUMNS} FROM "item_progress" WHERE "userId" = ? ORDER BY "itemId""#
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(map_progress_row).collect()
    }

    async fn list_due(
        &self,
        user_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ItemProgress>, StoreError> {
        let sql = format!(
            r#"SELECT {PROGRESS_COLUMNS} FROM "item_progress"
            WHERE "userId" = ? AND "nextReviewDate" <= ?
            ORDER BY "nextReviewDate", "itemId""#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(to_millis(as_of))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert(
        &self,
        mut progress: ItemProgress,
        expected_version: Option<i64>,
    ) -> Result<ItemProgress, StoreError> {
        validate_progress(&progress)?;
        let mut conn = self.pool.acquire().await?;
        progress.version = write_progress(&mut conn, &progress, expected_version).await?;
        Ok(progress)
    }

    async fn count_reviewed(&self, user_id: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "item_progress" WHERE "userId" = ? AND "totalReviews" >= 1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        to_u64("count", count)
    }

    async fn get_stats(&self, user_id: &str) -> Result<Option<UserLearningStats>, StoreError> {
        let sql = format!(
            r#"SELECT {STATS_COLUMNS} FROM "user_learning_stats" WHERE "userId" = ? LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_stats_row).transpose()
    }

    async fn upsert_stats(
        &self,
        mut stats: UserLearningStats,
        expected_version: Option<i64>,
    ) -> Result<UserLearningStats, StoreError> {
        validate_stats(&stats)?;
        let mut conn = self.pool.acquire().await?;
        stats.version = write_stats(&mut conn, &stats, expected_version).await?;
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

        // an early return drops the transaction, which rolls it back
        let mut tx = self.pool.begin().await?;
        progress.version = write_progress(&mut tx, &progress, expected_progress_version).await?;
        stats.version = write_stats(&mut tx, &stats, expected_stats_version).await?;
        tx.commit().await?;

        Ok((progress, stats))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// CAS write of one progress row; returns the version it now holds.
async fn write_progress(
    conn: &mut SqliteConnection,
    progress: &ItemProgress,
    expected_version: Option<i64>,
) -> Result<i64, StoreError> {
    let new_version = expected_version.unwrap_or(0) + 1;

    let result = match expected_version {
        None => {
            sqlx::query(
                r#"
                INSERT INTO "item_progress" (
                  "userId","itemId","itemKind","easinessFactor","repetitions",
                  "intervalDays","nextReviewDate","lastReviewDate","lastQuality","totalReviews",
                  "correctReviews","masteryLevel","version","createdAt","updatedAt"
                ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
                ON CONFLICT ("userId","itemId") DO NOTHING
                "#,
            )
            .bind(&progress.user_id)
            .bind(&progress.item_id)
            .bind(progress.item_kind.as_str())
            .bind(progress.easiness_factor)
            .bind(i64::from(progress.repetitions))
            .bind(progress.interval_days)
            .bind(to_millis(progress.next_review_date))
            .bind(progress.last_review_date.map(to_millis))
            .bind(i64::from(progress.last_quality))
            .bind(i64::from(progress.total_reviews))
            .bind(i64::from(progress.correct_reviews))
            .bind(progress.mastery_level.as_str())
            .bind(new_version)
            .bind(to_millis(progress.created_at))
            .bind(to_millis(progress.updated_at))
            .execute(&mut *conn)
            .await?
        }
        Some(expected) => {
            sqlx::query(
                r#"
                UPDATE "item_progress" SET
                  "easinessFactor" = ?, "repetitions" = ?, "intervalDays" = ?,
                  "nextReviewDate" = ?, "lastReviewDate" = ?, "lastQuality" = ?,
                  "totalReviews" = ?, "correctReviews" = ?, "masteryLevel" = ?,
                  "version" = ?, "updatedAt" = ?
                WHERE "userId" = ? AND "itemId" = ? AND "version" = ?
                "#,
            )
            .bind(progress.easiness_factor)
            .bind(i64::from(progress.repetitions))
            .bind(progress.interval_days)
            .bind(to_millis(progress.next_review_date))
            .bind(progress.last_review_date.map(to_millis))
            .bind(i64::from(progress.last_quality))
            .bind(i64::from(progress.total_reviews))
            .bind(i64::from(progress.correct_reviews))
            .bind(progress.mastery_level.as_str())
            .bind(new_version)
            .bind(to_millis(progress.updated_at))
            .bind(&progress.user_id)
            .bind(&progress.item_id)
            .bind(expected)
            .execute(&mut *conn)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict);
    }
    Ok(new_version)
}

async fn write_stats(
    conn: &mut SqliteConnection,
    stats: &UserLearningStats,
    expected_version: Option<i64>,
) -> Result<i64, StoreError> {
    let new_version = expected_version.unwrap_or(0) + 1;
    let last_study_date = stats
        .last_study_date
        .map(|date| date.format(DATE_FORMAT).to_string());

    let result = match expected_version {
        None => {
            sqlx::query(
                r#"
                INSERT INTO "user_learning_stats" (
                  "userId","totalWordsLearned","totalStudyTimeMinutes","streakDays",
                  "lastStudyDate","currentLevel","dailyGoal","version","updatedAt"
                ) VALUES (?,?,?,?,?,?,?,?,?)
                ON CONFLICT ("userId") DO NOTHING
                "#,
            )
            .bind(&stats.user_id)
            .bind(to_i64(stats.total_words_learned))
            .bind(to_i64(stats.total_study_time_minutes))
            .bind(i64::from(stats.streak_days))
            .bind(last_study_date)
            .bind(i64::from(stats.current_level))
            .bind(i64::from(stats.daily_goal))
            .bind(new_version)
            .bind(stats.updated_at.map(to_millis))
            .execute(&mut *conn)
            .await?
        }
        Some(expected) => {
            sqlx::query(
                r#"
                UPDATE "user_learning_stats" SET
                  "totalWordsLearned" = ?, "totalStudyTimeMinutes" = ?, "streakDays" = ?,
                  "lastStudyDate" = ?, "currentLevel" = ?, "dailyGoal" = ?,
                  "version" = ?, "updatedAt" = ?
                WHERE "userId" = ? AND "version" = ?
                "#,
            )
            .bind(to_i64(stats.total_words_learned))
            .bind(to_i64(stats.total_study_time_minutes))
            .bind(i64::from(stats.streak_days))
            .bind(last_study_date)
            .bind(i64::from(stats.current_level))
            .bind(i64::from(stats.daily_goal))
            .bind(new_version)
            .bind(stats.updated_at.map(to_millis))
            .bind(&stats.user_id)
            .bind(expected)
            .execute(&mut *conn)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict);
    }
    Ok(new_version)
}

fn map_progress_row(row: &SqliteRow) -> Result<ItemProgress, StoreError> {
    let kind: String = row.try_get("itemKind")?;
    let level: String = row.try_get("masteryLevel")?;
    let last_review: Option<i64> = row.try_get("lastReviewDate")?;

    Ok(ItemProgress {
        user_id: row.try_get("userId")?,
        item_id: row.try_get("itemId")?,
        item_kind: ItemKind::parse(&kind)
            .ok_or_else(|| StoreError::Invalid(format!("unknown itemKind {kind}")))?,
        easiness_factor: row.try_get("easinessFactor")?,
        repetitions: to_u32("repetitions", row.try_get("repetitions")?)?,
        interval_days: row.try_get("intervalDays")?,
        next_review_date: from_millis("nextReviewDate", row.try_get("nextReviewDate")?)?,
        last_review_date: last_review
            .map(|ms| from_millis("lastReviewDate", ms))
            .transpose()?,
        last_quality: u8::try_from(row.try_get::<i64, _>("lastQuality")?)
            .map_err(|_| StoreError::Invalid("lastQuality out of range".to_string()))?,
        total_reviews: to_u32("totalReviews", row.try_get("totalReviews")?)?,
        correct_reviews: to_u32("correctReviews", row.try_get("correctReviews")?)?,
        mastery_level: MasteryLevel::parse(&level)
            .ok_or_else(|| StoreError::Invalid(format!("unknown masteryLevel {level}")))?,
        version: row.try_get("version")?,
        created_at: from_millis("createdAt", row.try_get("createdAt")?)?,
        updated_at: from_millis("updatedAt", row.try_get("updatedAt")?)?,
    })
}

fn map_stats_row(row: &SqliteRow) -> Result<UserLearningStats, StoreError> {
    let last_study_date = row
        .try_get::<Option<String>, _>("lastStudyDate")?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map_err(|_| StoreError::Invalid(format!("malformed lastStudyDate {raw}")))
        })
        .transpose()?;
    let updated_at = row
        .try_get::<Option<i64>, _>("updatedAt")?
        .map(|ms| from_millis("updatedAt", ms))
        .transpose()?;

    Ok(UserLearningStats {
        user_id: row.try_get("userId")?,
        total_words_learned: to_u64("totalWordsLearned", row.try_get("totalWordsLearned")?)?,
        total_study_time_minutes: to_u64(
            "totalStudyTimeMinutes",
            row.try_get("totalStudyTimeMinutes")?,
        )?,
        streak_days: to_u32("streakDays", row.try_get("streakDays")?)?,
        last_study_date,
        current_level: to_u32("currentLevel", row.try_get("currentLevel")?)?,
        daily_goal: to_u32("dailyGoal", row.try_get("dailyGoal")?)?,
        version: row.try_get("version")?,
        updated_at,
    })
}
