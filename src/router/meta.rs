//! Discovery and health routes.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::helpers::{header_str, now_iso};
use crate::manifest;
use crate::state::SharedState;

/// Creates routes for discovery metadata and health probes.
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(discovery).post(discovery))
        .route("/healthz", get(healthz))
        .route("/healthz/ready", get(ready))
        .route("/mcp-manifest.json", get(mcp_manifest))
}

/// Endpoint: GET|POST /
///
/// Agent connectors probe the root during setup; both methods answer with
/// the discovery metadata.
async fn discovery(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let payload = manifest::discovery_metadata(&state.config, header_str(&headers, "host"));
    ([(header::CACHE_CONTROL, "no-store")], Json(payload))
}

/// Endpoint: GET /healthz
async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "status": "ok",
        "timestamp": now_iso(),
        "demoMode": state.config.demo_mode,
    }))
}

/// Endpoint: GET /healthz/ready
async fn ready() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "ready": true,
    }))
}

/// Endpoint: GET /mcp-manifest.json
async fn mcp_manifest(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let payload = manifest::mcp_manifest(&state.config, header_str(&headers, "host"));
    ([(header::CACHE_CONTROL, "no-store")], Json(payload))
}
