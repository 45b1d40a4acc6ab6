//! `/:application/:endpoint` for every verb. The handler rejects verbs outside the
//! five CRUD verbs itself so the error carries the JSON envelope.

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::handlers::dispatch;
use crate::state::AppState;
use axum::{routing::any, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn endpoint_routes(state: AppState) -> Router {
    endpoint_routes_with_limit(state, DEFAULT_MAX_BODY_BYTES)
}

pub fn endpoint_routes_with_limit(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/:application/:endpoint", any(dispatch))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
