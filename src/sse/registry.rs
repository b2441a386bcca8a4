//! Registry of live SSE connections.
//!
//! Keyed by connection ID; entries are inserted on connect and removed on
//! send failure, disconnect, or stale reaping. The map is the only mutable
//! shared structure in the process, so all mutation goes through the
//! concurrent-map API.

use axum::response::sse::Event;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::error::GatewayError;

/// A connected SSE client.
struct SseClient {
    tx: mpsc::UnboundedSender<Event>,
    /// Unix milliseconds of the last successful send.
    last_activity: AtomicI64,
}

/// Concurrent registry of SSE connections.
pub struct SseRegistry {
    clients: DashMap<String, SseClient>,
}

impl Default for SseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SseRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Registers a new connection and returns the event receiver backing its
    /// stream.
    pub fn register(&self, connection_id: &str) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(
            connection_id.to_string(),
            SseClient {
                tx,
                last_activity: AtomicI64::new(Utc::now().timestamp_millis()),
            },
        );
        rx
    }

    /// Removes a connection. Dropping the sender ends the client's stream.
    pub fn remove(&self, connection_id: &str) {
        if self.clients.remove(connection_id).is_some() {
            info!(connection_id, "SSE connection closed");
        }
    }

    /// Sends an event to a connection, updating its activity stamp.
    ///
    /// Returns `false` when the connection is unknown or has gone away; a
    /// dead connection is removed as a side effect.
    pub fn send(&self, connection_id: &str, event: Event) -> bool {
        let delivered = match self.clients.get(connection_id) {
            Some(client) => {
                if client.tx.send(event).is_ok() {
                    client
                        .last_activity
                        .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
                    true
                } else {
                    false
                }
            }
            None => return false,
        };

        if !delivered {
            self.remove(connection_id);
        }
        delivered
    }

    /// Pushes a successful tool result as an `mcp.tool_response` event.
    pub fn push_tool_response(
        &self,
        connection_id: &str,
        tool: &str,
        correlation_id: &str,
        result: &Value,
    ) -> bool {
        self.send(
            connection_id,
            sse_message(
                "mcp.tool_response",
                &json!({
                    "tool": tool,
                    "correlationId": correlation_id,
                    "result": result,
                }),
            ),
        )
    }

    /// Pushes a classified failure as an `mcp.error` event.
    pub fn push_error(
        &self,
        connection_id: &str,
        tool: &str,
        correlation_id: &str,
        error: &GatewayError,
    ) -> bool {
        self.send(
            connection_id,
            sse_message(
                "mcp.error",
                &json!({
                    "tool": tool,
                    "correlationId": correlation_id,
                    "error": error.error_object(correlation_id),
                }),
            ),
        )
    }

    /// Removes connections idle longer than `max_idle`; returns the count.
    pub fn reap_stale(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now().timestamp_millis() - max_idle.as_millis() as i64;
        let stale: Vec<String> = self
            .clients
            .iter()
            .filter(|entry| entry.last_activity.load(Ordering::Relaxed) < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        for connection_id in &stale {
            self.remove(connection_id);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Builds an SSE message with a unique event ID, matching the transport's
/// `id:` / `event:` / `data:` framing.
pub fn sse_message(event: &str, data: &Value) -> Event {
    Event::default()
        .id(Uuid::new_v4().to_string())
        .event(event)
        .data(data.to_string())
}
