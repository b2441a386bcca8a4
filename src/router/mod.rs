//! Router assembly for the gateway.
//!
//! Middleware order (outermost first): request tracing, correlation ID
//! propagation, origin guard. The guard therefore always has a resolved
//! correlation ID for its denial envelopes, and every response carries the
//! echoed `X-Correlation-ID` header.

use axum::{
    extract::Request,
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    Extension, Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::correlation::{self, CorrelationId};
use crate::error::GatewayError;
use crate::origin;
use crate::state::SharedState;

pub mod meta;
pub mod tools;

/// Creates and configures the application router with all routes and
/// middleware.
pub fn create_app_router(state: SharedState) -> Router {
    Router::new()
        .merge(meta::routes())
        .merge(tools::routes())
        .merge(crate::mcp::routes())
        .merge(crate::sse::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), origin::guard))
        .layer(middleware::from_fn(correlation::propagate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fallback for unmatched routes: a `NOT_FOUND` failure envelope.
async fn not_found(Extension(correlation_id): Extension<CorrelationId>, request: Request) -> Response {
    let uri: &Uri = request.uri();
    let err = GatewayError::NotFound(uri.path().to_string());
    (err.status(), Json(err.envelope(correlation_id.as_str()))).into_response()
}
