use axum::extract::{Path, State};
use axum::response::IntoResponse;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;

use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudyPlanRequest {
    #[serde(default)]
    candidate_item_ids: Vec<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn study_plan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: StudyPlanRequest = if body.is_empty() {
        StudyPlanRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::validation(format!("请求参数不合法: {err}")))?
    };

    let plan = state
        .reviews()
        .study_plan(&user_id, &request.candidate_item_ids, request.limit, Utc::now())
        .await?;
    Ok(SuccessResponse::ok(plan))
}
