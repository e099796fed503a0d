pub mod progress;
pub mod sessions;

pub use progress::SqliteProgressStore;
pub use sessions::SqliteSessionLog;

use chrono::{DateTime, Utc};

use crate::store::StoreError;

pub(crate) fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_millis(field: &str, millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Invalid(format!("{field} out of range: {millis}")))
}

pub(crate) fn to_u32(field: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Invalid(format!("{field} out of range: {value}")))
}

pub(crate) fn to_u64(field: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Invalid(format!("{field} out of range: {value}")))
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
