use partner_gateway::config::GatewayConfig;
use partner_gateway::router::create_app_router;
use partner_gateway::sse;
use partner_gateway::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Structured logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Freeze configuration and build the shared state.
    let config = GatewayConfig::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = Arc::new(AppState::new(config));

    info!(
        port = state.config.http_port,
        demo_mode = state.config.demo_mode,
        allowed_origins = state.origins.len(),
        "gateway starting"
    );

    // Reap idle SSE connections in the background.
    sse::spawn_stale_sweeper(state.clone());

    // Build the router and start the server.
    let app = create_app_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
