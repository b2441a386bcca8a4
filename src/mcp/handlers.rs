//! MCP route handlers: JSON-RPC dispatch and the SSE handshake shim.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{helpers::*, models::*};
use crate::correlation::CorrelationId;
use crate::dispatch::{dispatch, ToolCall};
use crate::manifest::{self, SERVER_NAME};
use crate::state::SharedState;

/// Creates routes for MCP operations.
pub fn routes() -> Router<SharedState> {
    Router::new().route("/mcp", post(handle_mcp).get(handle_mcp_sse))
}

/// Handles the SSE handshake for GET requests: points streaming clients at
/// the JSON-RPC endpoint.
async fn handle_mcp_sse() -> impl IntoResponse {
    (
        [("content-type", "text/event-stream")],
        "event: endpoint\ndata: /mcp\n\n",
    )
}

/// Endpoint: POST /mcp
///
/// Parses the JSON-RPC envelope and dispatches the method.
async fn handle_mcp(
    State(state): State<SharedState>,
    Extension(correlation_id): Extension<CorrelationId>,
    body: Bytes,
) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(parse_err) => {
            warn!(correlation_id = %correlation_id, error = %parse_err, "JSON-RPC parse error");
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(Value::Null, -32700, "Parse error")),
            )
                .into_response();
        }
    };

    let id = request.id.unwrap_or(Value::Null);
    let method = request.method.as_str();
    let params = request.params.unwrap_or(Value::Null);

    info!(correlation_id = %correlation_id, method, "MCP call");

    let response = match method {
        "initialize" => rpc_success(id, initialize_result()),
        "notifications/initialized" => rpc_success(id, json!({})),
        "tools/list" => rpc_success(id, manifest::tool_list()),
        "tools/call" => {
            let tool = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            let call = ToolCall {
                tool,
                params: arguments,
                correlation_id: correlation_id.as_str(),
                idempotency_key: None,
            };
            match dispatch(&state, call).await {
                Ok(result) => rpc_success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": result.to_string() }],
                        "structuredContent": result,
                    }),
                ),
                Err(err) => rpc_failure(id, &err, correlation_id.as_str()),
            }
        }
        "ping" => rpc_success(id, json!({})),
        other => {
            warn!(correlation_id = %correlation_id, method = other, "unknown MCP method");
            rpc_error(id, -32601, format!("Method not found: {other}"))
        }
    };

    Json(response).into_response()
}

/// Handles the `initialize` handshake.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": true },
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}
