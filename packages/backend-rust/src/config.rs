use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use lingo_algo::DEFAULT_DAILY_GOAL;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_LOG_CAPACITY: usize = 1000;
pub const DEFAULT_SUBMIT_MAX_RETRIES: u32 = 3;
pub const MIN_UTC_OFFSET_MINUTES: i32 = -720;
pub const MAX_UTC_OFFSET_MINUTES: i32 = 840;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for the rolling log file, `None` when file logging is off
    pub log_dir: Option<PathBuf>,
    pub store_backend: StoreBackend,
    pub database_path: PathBuf,
    pub session_log_capacity: usize,
    pub default_daily_goal: u32,
    pub submit_max_retries: u32,
    /// Offset applied to UTC when a submission carries no `localDate`
    pub study_day_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            log_dir: None,
            store_backend: StoreBackend::Memory,
            database_path: default_database_path(),
            session_log_capacity: DEFAULT_SESSION_LOG_CAPACITY,
            default_daily_goal: DEFAULT_DAILY_GOAL,
            submit_max_retries: DEFAULT_SUBMIT_MAX_RETRIES,
            study_day_offset_minutes: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let host = lookup("HOST")
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
            .unwrap_or(defaults.host);

        let log_level = lookup("RUST_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_level);

        let log_dir = if lookup("ENABLE_FILE_LOGS").as_deref().and_then(parse_bool) == Some(true) {
            Some(
                lookup("LOG_DIR")
                    .filter(|value| !value.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./logs")),
            )
        } else {
            None
        };

        let store_backend = lookup("STORE_BACKEND")
            .as_deref()
            .and_then(StoreBackend::parse)
            .unwrap_or(defaults.store_backend);

        let database_path = lookup("DATABASE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let session_log_capacity = lookup("SESSION_LOG_CAPACITY")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.session_log_capacity);

        let default_daily_goal = lookup("DEFAULT_DAILY_GOAL")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.default_daily_goal);

        let submit_max_retries = lookup("SUBMIT_MAX_RETRIES")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(defaults.submit_max_retries);

        let study_day_offset_minutes = lookup("STUDY_DAY_UTC_OFFSET_MINUTES")
            .and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|value| (MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(value))
            .unwrap_or(defaults.study_day_offset_minutes);

        Self {
            host,
            port,
            log_level,
            log_dir,
            store_backend,
            database_path,
            session_log_capacity,
            default_daily_goal,
            submit_max_retries,
            study_day_offset_minutes,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lingo")
        .join("progress.db")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
