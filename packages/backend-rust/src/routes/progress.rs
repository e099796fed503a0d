use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use lingo_algo::ItemKind;
use serde::Deserialize;

use super::{parse_as_of, parse_limit};
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    item_id: Option<String>,
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueQuery {
    limit: Option<String>,
    as_of: Option<String>,
}

/// `?itemId=` returns one record, otherwise the (optionally kind-filtered) list.
pub async fn list_or_get(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> Result<Response, AppError> {
    let reviews = state.reviews();

    if let Some(item_id) = query.item_id.as_deref() {
        let progress = reviews.get_progress(&user_id, item_id).await?;
        return Ok(SuccessResponse::ok(progress).into_response());
    }

    let kind = match query.kind.as_deref() {
        None => None,
        Some(raw) => Some(ItemKind::parse(raw).ok_or_else(|| {
            AppError::validation(format!("kind must be word or sentence, got {raw}"))
        })?),
    };

    let items = reviews.list_progress(&user_id, kind).await?;
    Ok(SuccessResponse::ok(items).into_response())
}

pub async fn get_one(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state.reviews().get_progress(&user_id, &item_id).await?;
    Ok(SuccessResponse::ok(progress))
}

pub async fn due(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DueQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let as_of = parse_as_of(query.as_of.as_deref())?;

    let ranked = state
        .reviews()
        .due_for_review(&user_id, limit, as_of)
        .await?;
    Ok(SuccessResponse::ok(ranked))
}
