//! Tool listing and invocation routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::correlation::CorrelationId;
use crate::dispatch::{dispatch, ToolCall};
use crate::error::GatewayError;
use crate::helpers::header_str;
use crate::idempotency::IDEMPOTENCY_HEADER;
use crate::manifest;
use crate::sse::SSE_CONNECTION_HEADER;
use crate::state::SharedState;

/// Creates routes for tool discovery and execution.
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/:tool_name", post(call_tool))
}

/// Endpoint: GET /tools
async fn list_tools() -> impl IntoResponse {
    Json(manifest::tool_list())
}

/// Endpoint: POST /tools/:toolName
///
/// Body is `{params: {...}}`; an absent or empty body counts as empty
/// params, anything unparsable is a `BAD_JSON` failure. When the request
/// names a live SSE connection, the outcome is pushed on that stream and the
/// HTTP response is a 202 acknowledgement.
async fn call_tool(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
    Extension(correlation_id): Extension<CorrelationId>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let idempotency_key = header_str(&headers, IDEMPOTENCY_HEADER);
    let sse_connection_id = header_str(&headers, SSE_CONNECTION_HEADER);

    let outcome = match parse_params(&body) {
        Ok(params) => {
            let call = ToolCall {
                tool: &tool_name,
                params,
                correlation_id: correlation_id.as_str(),
                idempotency_key,
            };
            dispatch(&state, call).await
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                tool = %tool_name,
                "malformed JSON body"
            );
            Err(err)
        }
    };

    respond(&state, &correlation_id, &tool_name, sse_connection_id, outcome)
}

/// Extracts the `params` object from the request body.
fn parse_params(body: &Bytes) -> Result<Value, GatewayError> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    let parsed: Value = serde_json::from_slice(body).map_err(|_| GatewayError::BadJson)?;
    Ok(parsed.get("params").cloned().unwrap_or_else(|| json!({})))
}

/// Sends the outcome either as a plain JSON response or, when a live SSE
/// connection is named, as an event on that stream with a 202 body.
fn respond(
    state: &SharedState,
    correlation_id: &CorrelationId,
    tool_name: &str,
    sse_connection_id: Option<&str>,
    outcome: Result<Value, GatewayError>,
) -> Response {
    if let Some(connection_id) = sse_connection_id {
        let delivered = match &outcome {
            Ok(result) => state.sse.push_tool_response(
                connection_id,
                tool_name,
                correlation_id.as_str(),
                result,
            ),
            Err(err) => {
                state
                    .sse
                    .push_error(connection_id, tool_name, correlation_id.as_str(), err)
            }
        };
        if delivered {
            return (
                StatusCode::ACCEPTED,
                Json(json!({ "ok": true, "message": "Response streamed via SSE" })),
            )
                .into_response();
        }
        // Unknown or dead connection: fall back to the JSON response.
    }

    match outcome {
        Ok(result) => Json(result).into_response(),
        Err(err) => (err.status(), Json(err.envelope(correlation_id.as_str()))).into_response(),
    }
}
