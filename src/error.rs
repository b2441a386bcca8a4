//! Gateway error taxonomy.
//!
//! Every failure that can reach a caller is one of the [`GatewayError`]
//! variants below, each with a stable wire code and an HTTP status. The
//! taxonomy is shared by all transports: HTTP routes serve the failure
//! envelope directly, the SSE push path embeds it in an `mcp.error` event,
//! and the JSON-RPC handler maps it into a JSON-RPC error object.

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::tools::UpstreamError;

/// Classified gateway failure.
///
/// The `#[error]` strings are the exact messages exposed to callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request origin is not in the allow-list.
    #[error("Origin not allowed")]
    CorsBlocked,

    /// Request body could not be parsed as JSON.
    #[error("Malformed JSON body")]
    BadJson,

    /// Input parameters violated the tool's schema.
    #[error("Invalid parameters")]
    BadParams {
        /// One human-readable message per violated constraint, in schema
        /// declaration order.
        details: Vec<String>,
    },

    /// No tool with this name is registered.
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// The collaborator call exceeded the per-request deadline.
    /// Kept on HTTP 500 to match the existing wire contract.
    #[error("Request timeout")]
    Timeout,

    /// Collaborator reported a 4xx-class failure. Re-exposed as 502: the
    /// gateway's upstream failed, the caller's request was not wrong.
    #[error("Upstream error: {0}")]
    Upstream4xx(String),

    /// Collaborator reported a 5xx-class failure.
    #[error("Upstream error: {0}")]
    Upstream5xx(String),

    /// Unmatched route (transport-level, not tool-level).
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Anything unclassified.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable taxonomy code carried in every failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CorsBlocked => "CORS_BLOCKED",
            Self::BadJson => "BAD_JSON",
            Self::BadParams { .. } => "BAD_PARAMS",
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::Timeout => "TIMEOUT",
            Self::Upstream4xx(_) => "UPSTREAM_4XX",
            Self::Upstream5xx(_) => "UPSTREAM_5XX",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the synchronous transport.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CorsBlocked => StatusCode::FORBIDDEN,
            Self::BadJson | Self::BadParams { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownTool(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream4xx(_) | Self::Upstream5xx(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON-RPC error code for the MCP transport.
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::BadJson => -32700,
            Self::BadParams { .. } | Self::UnknownTool(_) => -32602,
            Self::NotFound(_) => -32601,
            Self::Internal(_) => -32603,
            Self::CorsBlocked | Self::Timeout | Self::Upstream4xx(_) | Self::Upstream5xx(_) => {
                -32000
            }
        }
    }

    /// The `error` object carried inside the failure envelope.
    pub fn error_object(&self, correlation_id: &str) -> Value {
        let mut error = json!({
            "code": self.code(),
            "message": self.to_string(),
            "correlationId": correlation_id,
        });
        if let Self::BadParams { details } = self {
            error["details"] = json!(details);
        }
        error
    }

    /// Full failure envelope: `{ok:false, error:{code, message, details?,
    /// correlationId}}`.
    pub fn envelope(&self, correlation_id: &str) -> Value {
        json!({
            "ok": false,
            "error": self.error_object(correlation_id),
        })
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout => Self::Timeout,
            UpstreamError::Status { status, message } if (400..500).contains(&status) => {
                Self::Upstream4xx(message)
            }
            UpstreamError::Status { message, .. } => Self::Upstream5xx(message),
            UpstreamError::Transport { message } => Self::Upstream5xx(message),
            UpstreamError::NotConfigured(message) => Self::Internal(message),
        }
    }
}
