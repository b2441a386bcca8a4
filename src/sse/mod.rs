//! Server-Sent Events transport.
//!
//! An SSE connection receives the manifest as an `mcp.init` event, periodic
//! `mcp.ping` heartbeats, and, when a tool call arrives with an
//! `X-SSE-Connection-ID` header, out-of-band `mcp.tool_response` /
//! `mcp.error` events. Connections are tracked in a registry so they can be
//! reaped once idle.

use std::time::Duration;
use tracing::info;

use crate::state::SharedState;

pub mod handlers;
pub mod registry;

pub use handlers::routes;
pub use registry::SseRegistry;

/// Header linking a tool call to a live SSE connection.
pub const SSE_CONNECTION_HEADER: &str = "x-sse-connection-id";

/// Interval between `mcp.ping` heartbeat events.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Idle time after which a connection is considered stale.
pub const STALE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Interval between stale-connection sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns the background task that reaps stale connections.
pub fn spawn_stale_sweeper(state: SharedState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.tick().await; // the first tick fires immediately
        loop {
            ticker.tick().await;
            let reaped = state.sse.reap_stale(STALE_TIMEOUT);
            if reaped > 0 {
                info!(reaped, "reaped stale SSE connections");
            }
        }
    });
}
