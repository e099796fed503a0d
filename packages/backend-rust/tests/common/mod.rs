#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lingo_backend_rust::config::StoreBackend;
use lingo_backend_rust::services::review::ReviewSettings;
use lingo_backend_rust::state::AppState;
use lingo_backend_rust::store::{InMemoryProgressStore, InMemorySessionLog};
use serde_json::Value;
use tower::ServiceExt;

pub fn create_test_app() -> Router {
    lingo_backend_rust::app(AppState::in_memory())
}

pub fn create_test_app_with(settings: ReviewSettings, session_capacity: usize) -> Router {
    let state = AppState::new(
        StoreBackend::Memory,
        Arc::new(InMemoryProgressStore::new()),
        Arc::new(InMemorySessionLog::new(session_capacity)),
        settings,
    );
    lingo_backend_rust::app(state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request through a clone of `app` and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
