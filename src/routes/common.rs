//! Common routes: health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    /// Connection identifier to "ok" / "unavailable".
    connections: BTreeMap<String, &'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let mut connections = BTreeMap::new();
    let mut healthy = true;
    for (id, database) in state.runtime.connections.iter() {
        let status = match database.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(connection = id, error = %e, "readiness check failed");
                healthy = false;
                "unavailable"
            }
        };
        connections.insert(id.to_string(), status);
    }
    if healthy {
        (StatusCode::OK, Json(ReadyBody { status: "ok", connections }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                connections,
            }),
        )
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes (no state): GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

/// Common routes including readiness across every registered connection.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
