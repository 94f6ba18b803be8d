//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ledgerline_account::application::command_handlers::ConflictPolicy;
use ledgerline_core::clock::Clock;
use ledgerline_core::repository::EventRepository;
use ledgerline_event_store::in_memory_event_store::InMemoryEventStore;
use ledgerline_test_support::FixedClock;
use tower::ServiceExt;

use ledgerline_api::routes;
use ledgerline_api::state::AppState;

/// Build the full app router over `store` with a fixed clock. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(store: &InMemoryEventStore) -> Router {
    build_test_app_with(Arc::new(store.clone()), ConflictPolicy::Surface)
}

/// Build the full app router over any repository and conflict policy.
pub fn build_test_app_with(
    event_repository: Arc<dyn EventRepository>,
    conflict_policy: ConflictPolicy,
) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    routes::app(AppState::new(clock, event_repository, conflict_policy))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
