use async_trait::async_trait;
use lingo_algo::{SessionType, StudySessionRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::store::{SessionRecorder, StoreError};

/// [`SessionRecorder`] backed by the `study_sessions` table, trimmed to
/// `capacity` rows after every insert.
#[derive(Clone)]
pub struct SqliteSessionLog {
    pool: SqlitePool,
    capacity: usize,
}

impl SqliteSessionLog {
    pub fn new(pool: SqlitePool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl SessionRecorder for SqliteSessionLog {
    async fn append(&self, record: StudySessionRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO "study_sessions"
              ("sessionId","userId","itemId","timestamp","quality","isCorrect","sessionType")
            VALUES (?,?,?,?,?,?,?)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.user_id)
        .bind(&record.item_id)
        .bind(to_millis(record.timestamp))
        .bind(i64::from(record.quality))
        .bind(record.is_correct)
        .bind(record.session_type.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM "study_sessions"
            WHERE "seq" NOT IN (
              SELECT "seq" FROM "study_sessions" ORDER BY "seq" DESC LIMIT ?
            )
            "#,
        )
        .bind(self.capacity as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StudySessionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "sessionId","userId","itemId","timestamp","quality","isCorrect","sessionType"
            FROM "study_sessions"
            WHERE "userId" = ?
            ORDER BY "seq" DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_session_row).collect()
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "study_sessions""#)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn map_session_row(row: &SqliteRow) -> Result<StudySessionRecord, StoreError> {
    let session_type: String = row.try_get("sessionType")?;
    let quality: i64 = row.try_get("quality")?;

    Ok(StudySessionRecord {
        session_id: row.try_get("sessionId")?,
        user_id: row.try_get("userId")?,
        item_id: row.try_get("itemId")?,
        timestamp: from_millis("timestamp", row.try_get("timestamp")?)?,
        quality: u8::try_from(quality)
            .map_err(|_| StoreError::Invalid(format!("quality out of range: {quality}")))?,
        is_correct: row.try_get("isCorrect")?,
        session_type: SessionType::parse(&session_type)
            .ok_or_else(|| StoreError::Invalid(format!("unknown sessionType {session_type}")))?,
    })
}
