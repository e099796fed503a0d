use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::{Config, StoreBackend};
use crate::db::{self, DbInitError, SqliteProgressStore, SqliteSessionLog};
use crate::services::review::{ReviewService, ReviewSettings};
use crate::store::{InMemoryProgressStore, InMemorySessionLog, ProgressStore, SessionRecorder};

#[derive(Debug, thiserror::Error)]
pub enum AppInitError {
    #[error("database init failed: {0}")]
    Database(#[from] DbInitError),
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    backend: StoreBackend,
    reviews: Arc<ReviewService>,
}

impl AppState {
    pub fn new(
        backend: StoreBackend,
        store: Arc<dyn ProgressStore>,
        recorder: Arc<dyn SessionRecorder>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            backend,
            reviews: Arc::new(ReviewService::new(store, recorder, settings)),
        }
    }

    /// Wire the store selected by `STORE_BACKEND`.
    pub async fn from_config(config: &Config) -> Result<Self, AppInitError> {
        let settings = ReviewSettings::from(config);

        let (store, recorder): (Arc<dyn ProgressStore>, Arc<dyn SessionRecorder>) =
            match config.store_backend {
                StoreBackend::Memory => (
                    Arc::new(InMemoryProgressStore::new()),
                    Arc::new(InMemorySessionLog::new(config.session_log_capacity)),
                ),
                StoreBackend::Sqlite => {
                    let pool = db::init_sqlite_pool(&config.database_path).await?;
                    (
                        Arc::new(SqliteProgressStore::new(pool.clone())),
                        Arc::new(SqliteSessionLog::new(pool, config.session_log_capacity)),
                    )
                }
            };

        tracing::info!(backend = config.store_backend.as_str(), "progress store initialized");
        Ok(Self::new(config.store_backend, store, recorder, settings))
    }

    /// In-memory state with default settings.
    pub fn in_memory() -> Self {
        let config = Config::default();
        Self::new(
            StoreBackend::Memory,
            Arc::new(InMemoryProgressStore::new()),
            Arc::new(InMemorySessionLog::new(config.session_log_capacity)),
            ReviewSettings::from(&config),
        )
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    pub fn reviews(&self) -> Arc<ReviewService> {
        Arc::clone(&self.reviews)
    }
}
