pub mod operations;
pub mod sqlite_schema;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::sqlite_schema::{schema_statements, SCHEMA_VERSION, SQLITE_SCHEMA_SQL};

pub use operations::{SqliteProgressStore, SqliteSessionLog};

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open (creating if needed) the database file and bring its schema up to date.
pub async fn init_sqlite_pool(db_path: &Path) -> Result<SqlitePool, DbInitError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DbInitError::Io(e.to_string()))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)
        .map_err(|e| DbInitError::Config(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_sqlite_migrations(&pool).await?;

    tracing::info!(path = %db_path.display(), "sqlite store ready");
    Ok(pool)
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), DbInitError> {
    let version = stored_schema_version(pool).await?;

    if version.as_deref() == Some(SCHEMA_VERSION) {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for stmt in schema_statements(SQLITE_SCHEMA_SQL) {
        sqlx::query(&stmt).execute(&mut *tx).await?;
    }
    sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        from = version.as_deref().unwrap_or("none"),
        to = SCHEMA_VERSION,
        "sqlite schema migrated"
    );
    Ok(())
}

/// Recorded schema version; `None` on a fresh file without the metadata table.
async fn stored_schema_version(pool: &SqlitePool) -> Result<Option<String>, sqlx::Error> {
    let has_metadata: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_db_metadata')",
    )
    .fetch_one(pool)
    .await?;
    if !has_metadata {
        return Ok(None);
    }

    sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
        .fetch_optional(pool)
        .await
}
