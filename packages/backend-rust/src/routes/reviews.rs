use axum::extract::{Path, State};
use axum::response::IntoResponse;
use bytes::Bytes;
use chrono::Utc;

use crate::response::{AppError, SuccessResponse};
use crate::services::review::SubmitReview;
use crate::state::AppState;

pub async fn submit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: SubmitReview = serde_json::from_slice(&body).map_err(|err| {
        tracing::debug!(error = %err, "rejected review body");
        AppError::validation(format!("请求参数不合法: {err}"))
    })?;

    let outcome = state
        .reviews()
        .submit_review(&user_id, request, Utc::now())
        .await?;

    Ok(SuccessResponse::ok(outcome))
}
