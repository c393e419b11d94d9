//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde_json::json;

use crate::AppState;

/// Health routes (no authentication)
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness probe with module identification
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "shelfmark-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
