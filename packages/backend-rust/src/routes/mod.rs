mod health;
mod plan;
mod progress;
mod reviews;
mod stats;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};

use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/users/:user_id/reviews",
            post(reviews::submit).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/progress",
            get(progress::list_or_get).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/progress/:item_id",
            get(progress::get_one).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/due",
            get(progress::due).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/stats",
            get(stats::overview).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/activity",
            get(stats::activity).fallback(fallback_handler),
        )
        .route(
            "/api/users/:user_id/study-plan",
            post(plan::study_plan).fallback(fallback_handler),
        )
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}

/// Parse an optional positive `limit` query value.
fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| AppError::validation(format!("limit must be a positive integer, got {value}"))),
    }
}

/// Parse an optional RFC 3339 `asOf` query value, defaulting to now.
fn parse_as_of(raw: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(Utc::now()),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| AppError::validation(format!("asOf must be an RFC 3339 timestamp, got {value}"))),
    }
}
