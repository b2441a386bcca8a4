//! Transport-agnostic tool dispatcher.
//!
//! Every tool invocation, regardless of transport (HTTP route, SSE push,
//! JSON-RPC call), flows through [`dispatch`]: registry lookup, input
//! validation, execution under a deadline, upstream-error classification,
//! and output re-validation. The dispatcher takes a plain [`ToolCall`] and
//! returns either the tool result or a classified [`GatewayError`]; it never
//! assumes any transport framing.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, warn};

use crate::error::GatewayError;
use crate::helpers::now_iso;
use crate::state::AppState;
use crate::tools::schema::{self, ValidParams};
use crate::tools::UpstreamError;

/// Upper bound on a single tool execution.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// One tool invocation, already stripped of transport framing.
#[derive(Debug)]
pub struct ToolCall<'a> {
    /// Tool name as supplied by the caller.
    pub tool: &'a str,
    /// Raw, unvalidated parameters.
    pub params: Value,
    /// Resolved correlation ID for logging and envelopes.
    pub correlation_id: &'a str,
    /// Caller-supplied idempotency key, if any.
    pub idempotency_key: Option<&'a str>,
}

/// Runs one tool invocation through the full pipeline.
pub async fn dispatch(state: &AppState, call: ToolCall<'_>) -> Result<Value, GatewayError> {
    let descriptor = schema::descriptor(call.tool)
        .ok_or_else(|| GatewayError::UnknownTool(call.tool.to_string()))?;

    let params = schema::validate_input(call.tool, &call.params)
        .map_err(|details| GatewayError::BadParams { details })?;

    // Idempotency keys only apply to mutating tools.
    let idempotency_key = if descriptor.mutating {
        call.idempotency_key
    } else {
        None
    };

    let result = match timeout(TOOL_TIMEOUT, execute(state, params, idempotency_key)).await {
        Err(_) => {
            warn!(
                tool = call.tool,
                correlation_id = call.correlation_id,
                "tool execution exceeded deadline"
            );
            return Err(GatewayError::Timeout);
        }
        Ok(Err(upstream)) => {
            error!(
                tool = call.tool,
                correlation_id = call.correlation_id,
                error = %upstream,
                "tool execution failed"
            );
            return Err(GatewayError::from(upstream));
        }
        Ok(Ok(result)) => result,
    };

    if let Err(mismatch) = schema::validate_output(call.tool, &result) {
        error!(
            tool = call.tool,
            correlation_id = call.correlation_id,
            mismatch = %mismatch,
            "tool result failed output validation"
        );
        return Err(GatewayError::Internal(
            "Tool produced an invalid result".to_string(),
        ));
    }

    Ok(result)
}

/// Executes the validated call against the tool's business logic.
async fn execute(
    state: &AppState,
    params: ValidParams,
    idempotency_key: Option<&str>,
) -> Result<Value, UpstreamError> {
    let demo_mode = state.config.demo_mode;
    match params {
        ValidParams::Ping(params) => {
            let name = params.name.unwrap_or_else(|| "World".to_string());
            Ok(json!({
                "ok": true,
                "message": format!("Hello, {name}!"),
                "timestamp": now_iso(),
            }))
        }
        ValidParams::SearchProducts(params) => {
            state.catalog.search_products(&params, demo_mode).await
        }
        ValidParams::CreateCheckoutSession(params) => {
            state
                .payments
                .create_checkout_session(&params, idempotency_key, demo_mode)
                .await
        }
        ValidParams::CreateSimpleCheckoutSession(params) => {
            state.payments.create_simple_session(&params, demo_mode).await
        }
        ValidParams::GetPaymentStatus(params) => {
            state
                .payments
                .get_payment_status(&params.payment_intent_id, demo_mode)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn demo_state() -> AppState {
        AppState::new(GatewayConfig {
            demo_mode: true,
            ..GatewayConfig::default()
        })
    }

    #[tokio::test]
    async fn test_unknown_tool_is_classified() {
        let state = demo_state();
        let err = dispatch(
            &state,
            ToolCall {
                tool: "frobnicate",
                params: json!({}),
                correlation_id: "cid",
                idempotency_key: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "UNKNOWN_TOOL");
        assert!(err.to_string().contains("frobnicate"));
    }

    #[tokio::test]
    async fn test_validation_failure_carries_details() {
        let state = demo_state();
        let err = dispatch(
            &state,
            ToolCall {
                tool: schema::SEARCH_PRODUCTS,
                params: json!({}),
                correlation_id: "cid",
                idempotency_key: None,
            },
        )
        .await
        .unwrap_err();

        match err {
            GatewayError::BadParams { details } => {
                assert_eq!(details, vec!["query is required".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let state = demo_state();
        let result = dispatch(
            &state,
            ToolCall {
                tool: schema::PING,
                params: json!({ "name": "Nick" }),
                correlation_id: "cid",
                idempotency_key: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(result["ok"], true);
        assert_eq!(result["message"], "Hello, Nick!");
        assert!(result["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_idempotency_key_ignored_for_non_mutating_tools() {
        let state = demo_state();
        let result = dispatch(
            &state,
            ToolCall {
                tool: schema::SEARCH_PRODUCTS,
                params: json!({ "query": "mug" }),
                correlation_id: "cid",
                idempotency_key: Some("abc123"),
            },
        )
        .await
        .unwrap();

        assert!(result.get("idempotencyKey").is_none());
    }
}
