//! Correlation ID resolution and propagation.
//!
//! Every request gets exactly one correlation ID: the caller's
//! `X-Correlation-ID` header verbatim when present and non-empty, otherwise a
//! fresh UUID. The resolved ID is stored in the request extensions for
//! handlers, echoed as a response header on every response, and embedded in
//! every failure envelope.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::fmt;
use uuid::Uuid;

/// Header used to carry the correlation ID in both directions.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Resolved per-request correlation ID, available via request extensions.
#[derive(Debug, Clone)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    // Fallback for paths that run outside the middleware stack.
    fn default() -> Self {
        Self("unknown".to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the correlation ID from the request headers.
pub fn resolve(headers: &HeaderMap) -> String {
    crate::helpers::header_str(headers, CORRELATION_HEADER)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware: resolves the correlation ID, exposes it to handlers, and
/// echoes it on the response.
pub async fn propagate(mut request: Request, next: Next) -> Response {
    let correlation_id = resolve(request.headers());
    request
        .extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
