//! Test utilities for integration tests
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use planner_core::PlannerConfig;
use planner_server::{AppState, app};
use serde_json::Value;
use tower::util::ServiceExt;

/// Creates a test application router over a fresh in-memory store.
pub fn test_app() -> Router {
    let state = AppState::new(&PlannerConfig::default()).expect("Failed to build app state");
    app(state)
}

/// Sends a request with an optional JSON body and returns the status and parsed body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
