//! Origin guard: strict allow-list CORS with exact matching.
//!
//! The allow-list is built once at startup from fixed development origins,
//! the known agent origins, the configured frontend origin, and the
//! `ALLOWED_ORIGINS` environment list. Every entry is normalized to
//! `scheme://host[:port]`; invalid entries are discarded. Membership is an
//! exact string test, never a prefix or substring check.
//!
//! Requests without an `Origin` header (same-origin fetches, curl,
//! server-to-server callers) are always allowed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use tracing::warn;
use url::Url;

use crate::{
    config::GatewayConfig,
    correlation::CorrelationId,
    error::GatewayError,
    state::SharedState,
};

/// Origins of the known external agent clients, always allowed.
const AGENT_ORIGINS: [&str; 2] = ["https://chat.openai.com", "https://chatgpt.com"];

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str =
    "Content-Type, X-Correlation-ID, X-Idempotency-Key, X-SSE-Connection-ID";
const EXPOSE_HEADERS: &str = "X-Correlation-ID";

/// Immutable set of allowed origins, built once per process.
#[derive(Debug)]
pub struct AllowedOrigins {
    origins: HashSet<String>,
}

impl AllowedOrigins {
    /// Builds the allow-list from the gateway configuration.
    pub fn build(config: &GatewayConfig) -> Self {
        let mut origins = HashSet::new();

        // Exact localhost variants for the configured ports.
        origins.insert(format!("http://localhost:{}", config.http_port));
        origins.insert(format!("https://localhost:{}", config.https_port));
        origins.insert(format!("http://127.0.0.1:{}", config.http_port));
        origins.insert(format!("https://127.0.0.1:{}", config.https_port));

        for agent in AGENT_ORIGINS {
            origins.insert(agent.to_string());
        }

        // Common frontend dev default.
        origins.insert("http://localhost:3000".to_string());

        if let Some(frontend) = &config.frontend_url {
            match normalize_origin(frontend) {
                Some(normalized) => {
                    origins.insert(normalized);
                }
                None => warn!(origin = %frontend, "discarding invalid frontend origin"),
            }
        }

        for raw in &config.extra_origins {
            match normalize_origin(raw) {
                Some(normalized) => {
                    origins.insert(normalized);
                }
                None => warn!(origin = %raw, "discarding invalid allowed origin"),
            }
        }

        Self { origins }
    }

    /// Exact-membership test. Absent origins are allowed; unparsable origins
    /// are not.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(raw) => match normalize_origin(raw) {
                Some(normalized) => self.origins.contains(&normalized),
                None => false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Normalizes an origin string to `scheme://host[:port]`.
///
/// Default ports are elided by the URL parser, so `https://example.com:443`
/// and `https://example.com` normalize identically.
pub fn normalize_origin(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Middleware: enforces the allow-list before any tool logic runs and
/// answers preflight requests.
pub async fn guard(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let origin = crate::helpers::header_str(request.headers(), header::ORIGIN.as_str())
        .map(str::to_owned);
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_default();

    if request.method() == Method::OPTIONS {
        return preflight(&state, origin.as_deref(), &correlation_id);
    }

    if !state.origins.is_allowed(origin.as_deref()) {
        warn!(
            origin = origin.as_deref().unwrap_or_default(),
            correlation_id = %correlation_id,
            "CORS blocked"
        );
        let err = GatewayError::CorsBlocked;
        return (err.status(), Json(err.envelope(correlation_id.as_str()))).into_response();
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), origin.as_deref());
    response
}

/// Answers an OPTIONS preflight: 204 with the CORS grant for allowed
/// origins, 403 with a `CORS_BLOCKED` envelope otherwise.
fn preflight(state: &SharedState, origin: Option<&str>, correlation_id: &CorrelationId) -> Response {
    if state.origins.is_allowed(origin) {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers, origin);
        return (StatusCode::NO_CONTENT, headers).into_response();
    }

    warn!(
        origin = origin.unwrap_or_default(),
        correlation_id = %correlation_id,
        "CORS preflight blocked"
    );
    let err = GatewayError::CorsBlocked;
    (err.status(), Json(err.envelope(correlation_id.as_str()))).into_response()
}

/// Sets the CORS grant headers. Only called for allowed origins.
fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&str>) {
    let allow_origin = origin
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
}
