use std::time::{Instant, SystemTime};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    start_time: String,
    uptime: u64,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessChecks {
    store: &'static str,
    backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_latency_ms: Option<u64>,
}

enum StoreCheck {
    Connected { latency_ms: u64 },
    Disconnected,
}

async fn root(State(state): State<AppState>) -> Response {
    let connected = matches!(store_check(&state).await, StoreCheck::Connected { .. });

    let response = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        store: if connected { "connected" } else { "disconnected" },
        timestamp: now_iso(),
    };

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let (store, latency) = match store_check(&state).await {
        StoreCheck::Connected { latency_ms } => ("connected", Some(latency_ms)),
        StoreCheck::Disconnected => ("disconnected", None),
    };
    let healthy = latency.is_some();

    let response = ReadinessResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        checks: ReadinessChecks {
            store,
            backend: state.backend().as_str(),
            store_latency_ms: latency,
        },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn store_check(state: &AppState) -> StoreCheck {
    let started = Instant::now();
    match state.reviews().ping().await {
        Ok(()) => StoreCheck::Connected {
            latency_ms: started.elapsed().as_millis() as u64,
        },
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            StoreCheck::Disconnected
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_time_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}
