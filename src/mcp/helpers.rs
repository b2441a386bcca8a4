//! JSON-RPC envelope construction helpers.

use serde_json::{json, Value};

use crate::error::GatewayError;

/// Builds a JSON-RPC 2.0 success response.
///
/// # Arguments
///
/// * `id` – The request identifier that must be echoed back.
/// * `result` – The payload representing the successful outcome.
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC 2.0 error response.
///
/// # Arguments
///
/// * `id` – The request identifier (or `null` if unavailable).
/// * `code` – The JSON-RPC error code (e.g., -32601 for method not found).
/// * `message` – Human-readable description of the error.
pub fn rpc_error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// Maps a classified gateway failure into a JSON-RPC error response.
///
/// The taxonomy code, details, and correlation ID travel in `error.data` so
/// MCP callers see the same classification as HTTP callers.
pub fn rpc_failure(id: Value, err: &GatewayError, correlation_id: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": err.rpc_code(),
            "message": err.to_string(),
            "data": err.error_object(correlation_id),
        }
    })
}
