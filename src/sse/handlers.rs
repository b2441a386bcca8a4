//! SSE route handlers.

use axum::{
    extract::State,
    http::HeaderMap,
    response::sse::{KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::StreamExt;
use serde_json::json;
use std::{convert::Infallible, time::Duration};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use uuid::Uuid;

use super::{registry::sse_message, HEARTBEAT_INTERVAL};
use crate::correlation::CorrelationId;
use crate::helpers::{header_str, now_iso};
use crate::manifest;
use crate::state::SharedState;

/// Creates the SSE transport route.
pub fn routes() -> Router<SharedState> {
    Router::new().route("/sse", get(sse_stream))
}

/// Endpoint: GET /sse
///
/// Registers the connection, emits the manifest as `mcp.init` before
/// anything else, then keeps the stream alive with `mcp.ping` heartbeats
/// until the client disconnects or the stale sweeper reaps the entry.
async fn sse_stream(
    State(state): State<SharedState>,
    Extension(correlation_id): Extension<CorrelationId>,
    headers: HeaderMap,
) -> Sse<impl futures_util::Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let connection_id = Uuid::new_v4().to_string();
    let rx = state.sse.register(&connection_id);

    info!(
        correlation_id = %correlation_id,
        connection_id = %connection_id,
        "SSE connection established"
    );

    // The init event must be queued before the response streams out.
    let manifest = manifest::mcp_manifest(&state.config, header_str(&headers, "host"));
    state.sse.send(&connection_id, sse_message("mcp.init", &manifest));

    let heartbeat_state = state.clone();
    let heartbeat_id = connection_id.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        ticker.tick().await; // the first tick fires immediately
        loop {
            ticker.tick().await;
            let ping = json!({ "timestamp": now_iso() });
            if !heartbeat_state
                .sse
                .send(&heartbeat_id, sse_message("mcp.ping", &ping))
            {
                // Client gone (disconnected or reaped); stop the heartbeat.
                break;
            }
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
