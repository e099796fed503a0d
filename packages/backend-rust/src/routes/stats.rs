use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;

use super::parse_limit;
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    limit: Option<String>,
}

pub async fn overview(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let overview = state.reviews().overview(&user_id, Utc::now()).await?;
    Ok(SuccessResponse::ok(overview))
}

pub async fn activity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let records = state.reviews().recent_activity(&user_id, limit).await?;
    Ok(SuccessResponse::ok(records))
}
