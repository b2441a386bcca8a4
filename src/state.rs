//! Application state.
//!
//! Everything the handlers need is built once at startup and shared behind
//! an `Arc`: the frozen configuration, the origin allow-list, the SSE
//! connection registry, and the collaborator clients. The SSE registry is
//! the only mutable structure; the rest is read-only after construction.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::origin::AllowedOrigins;
use crate::sse::SseRegistry;
use crate::tools::{CatalogClient, PaymentsClient};

/// Shared application state that can be safely passed between tasks.
pub type SharedState = Arc<AppState>;

/// Process-wide state for the gateway.
pub struct AppState {
    /// Frozen deployment configuration.
    pub config: GatewayConfig,

    /// Origin allow-list, built once from the configuration.
    pub origins: AllowedOrigins,

    /// Registry of live SSE connections.
    pub sse: SseRegistry,

    /// Commerce platform client.
    pub catalog: CatalogClient,

    /// Payment platform client.
    pub payments: PaymentsClient,
}

impl AppState {
    /// Builds the state from a configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let origins = AllowedOrigins::build(&config);
        let catalog = CatalogClient::new(&config.commerce);
        let payments = PaymentsClient::new(&config.payment, config.frontend_url.clone());

        Self {
            config,
            origins,
            sse: SseRegistry::new(),
            catalog,
            payments,
        }
    }
}
