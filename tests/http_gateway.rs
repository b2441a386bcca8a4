//! Integration tests for the HTTP/JSON transport.
//!
//! These tests drive the full router (middleware included) and verify:
//! - discovery, health, and manifest routes
//! - tool execution envelopes, success and failure
//! - parameter validation failures with per-constraint details
//! - correlation ID round-trips
//! - idempotency key handling
//! - origin allow-listing and preflight negotiation

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use partner_gateway::config::GatewayConfig;
use partner_gateway::router::create_app_router;
use partner_gateway::state::AppState;

/// Helper function to create a test app instance in demo mode.
fn create_test_app() -> axum::Router {
    let config = GatewayConfig {
        demo_mode: true,
        ..GatewayConfig::default()
    };
    create_app_router(Arc::new(AppState::new(config)))
}

/// Sends a request and collects status, headers, and parsed JSON body.
async fn send_request(
    app: &axum::Router,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, headers, body)
}

/// Helper to POST a tool call with optional extra headers.
async fn post_tool(
    app: &axum::Router,
    tool: &str,
    params: Value,
    extra_headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/tools/{tool}"))
        .header("content-type", "application/json");
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(
            serde_json::to_string(&json!({ "params": params })).unwrap(),
        ))
        .unwrap();

    send_request(app, request).await
}

#[tokio::test]
async fn test_healthz() {
    let app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["demoMode"], true);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/healthz/ready")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "ready": true }));
}

#[tokio::test]
async fn test_root_discovery_metadata() {
    let app = create_test_app();
    for method in ["GET", "POST"] {
        let request = Request::builder()
            .method(method)
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = send_request(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
        assert_eq!(body["mcp"], true);
        assert_eq!(body["manifest"], "/mcp-manifest.json");
        assert_eq!(body["sse"], "/sse");
    }
}

#[tokio::test]
async fn test_manifest_lists_tools_with_parameters() {
    let app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/mcp-manifest.json")
        .header("host", "gateway.example.com")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "partner-integration-gateway");
    assert_eq!(body["homepage"], "https://gateway.example.com");

    let tools = body["tools"].as_array().unwrap();
    let names: Vec<&str> = tools
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "ping",
            "searchProducts",
            "createCheckoutSession",
            "createSimpleCheckoutSession",
            "getPaymentStatus",
        ]
    );
    assert!(tools.iter().all(|tool| tool["parameters"].is_object()));
}

#[tokio::test]
async fn test_tools_listing_uses_input_schema() {
    let app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/tools")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert!(tools.iter().all(|tool| tool["inputSchema"].is_object()));
}

#[tokio::test]
async fn test_ping_end_to_end() {
    let app = create_test_app();
    let (status, headers, body) = post_tool(&app, "ping", json!({ "name": "Nick" }), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "Hello, Nick!");
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
    // A correlation ID is generated and echoed even when none was supplied.
    assert!(!headers.get("x-correlation-id").unwrap().is_empty());
}

#[tokio::test]
async fn test_ping_defaults_to_world() {
    let app = create_test_app();
    let (status, _, body) = post_tool(&app, "ping", json!({}), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello, World!");
}

#[tokio::test]
async fn test_search_products_returns_mock_results() {
    let app = create_test_app();
    let (status, _, body) =
        post_tool(&app, "searchProducts", json!({ "query": "mug", "limit": 3 }), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["query"], "mug");

    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert!(products[0]["title"].as_str().unwrap().contains("mug"));
}

#[tokio::test]
async fn test_search_products_missing_query_is_bad_params() {
    let app = create_test_app();
    let (status, _, body) = post_tool(&app, "searchProducts", json!({}), &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "BAD_PARAMS");

    let details = body["error"]["details"].as_array().unwrap();
    assert!(!details.is_empty());
    assert!(details[0].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn test_checkout_session_with_idempotency_key() {
    let app = create_test_app();
    let params = json!({
        "items": [{ "priceId": "price_123", "quantity": 1 }],
        "successUrl": "https://example.com/success",
        "cancelUrl": "https://example.com/cancel",
    });
    let headers = [("x-idempotency-key", "abc123")];

    let (status, _, first) =
        post_tool(&app, "createCheckoutSession", params.clone(), &headers).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["ok"], true);
    assert!(first["sessionId"].as_str().unwrap().contains("abc123"));
    assert_eq!(first["idempotencyKey"], "abc123");

    // Same key, same derived identifier.
    let (_, _, second) = post_tool(&app, "createCheckoutSession", params, &headers).await;
    assert_eq!(first["sessionId"], second["sessionId"]);
}

#[tokio::test]
async fn test_checkout_session_invalid_success_url() {
    let app = create_test_app();
    let params = json!({
        "items": [{ "priceId": "price_123", "quantity": 1 }],
        "successUrl": "not-a-url",
        "cancelUrl": "https://example.com/cancel",
    });

    let (status, _, body) = post_tool(&app, "createCheckoutSession", params, &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_PARAMS");
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details[0].as_str().unwrap().contains("successUrl"));
}

#[tokio::test]
async fn test_checkout_session_non_positive_quantity() {
    let app = create_test_app();
    let params = json!({
        "items": [{ "priceId": "price_123", "quantity": 0 }],
        "successUrl": "https://example.com/success",
        "cancelUrl": "https://example.com/cancel",
    });

    let (status, _, body) = post_tool(&app, "createCheckoutSession", params, &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_PARAMS");
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details[0].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn test_simple_checkout_session() {
    let app = create_test_app();
    let params = json!({ "productName": "Mug", "price": 49.99 });

    let (status, _, body) = post_tool(&app, "createSimpleCheckoutSession", params, &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "demo_session_123");
    assert_eq!(body["payment_intent"], "demo_pi_123");
    assert!(body["checkout_url"].is_string());
}

#[tokio::test]
async fn test_payment_status() {
    let app = create_test_app();
    let params = json!({ "paymentIntentId": "pi_123" });

    let (status, _, body) = post_tool(&app, "getPaymentStatus", params, &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "succeeded");
    assert_eq!(body["amount"], 2999);
    assert_eq!(body["currency"], "usd");
}

#[tokio::test]
async fn test_unknown_tool_names_the_offender() {
    let app = create_test_app();
    let (status, _, body) = post_tool(&app, "frobnicate", json!({}), &[]).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "UNKNOWN_TOOL");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("frobnicate"));
    assert!(body["error"]["correlationId"].is_string());
}

#[tokio::test]
async fn test_correlation_id_round_trip_on_success() {
    let app = create_test_app();
    let headers = [("x-correlation-id", "trace-xyz")];
    let (status, response_headers, _) = post_tool(&app, "ping", json!({}), &headers).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response_headers.get("x-correlation-id").unwrap(), "trace-xyz");
}

#[tokio::test]
async fn test_correlation_id_round_trip_on_failure() {
    let app = create_test_app();
    let headers = [("x-correlation-id", "trace-fail")];
    let (status, response_headers, body) =
        post_tool(&app, "searchProducts", json!({}), &headers).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response_headers.get("x-correlation-id").unwrap(),
        "trace-fail"
    );
    assert_eq!(body["error"]["correlationId"], "trace-fail");
}

#[tokio::test]
async fn test_malformed_body_is_bad_json() {
    let app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/tools/ping")
        .header("content-type", "application/json")
        .body(Body::from("not json {{{"))
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_JSON");
}

#[tokio::test]
async fn test_empty_body_counts_as_empty_params() {
    let app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/tools/ping")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello, World!");
}

#[tokio::test]
async fn test_unregistered_origin_is_blocked() {
    let app = create_test_app();
    let headers = [("origin", "https://evil.example")];
    let (status, response_headers, body) = post_tool(&app, "ping", json!({}), &headers).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "CORS_BLOCKED");
    // No CORS grant for a blocked origin.
    assert!(response_headers
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn test_allowed_origin_gets_cors_grant() {
    let app = create_test_app();
    let headers = [("origin", "http://localhost:3000")];
    let (status, response_headers, _) = post_tool(&app, "ping", json!({}), &headers).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response_headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        response_headers
            .get("access-control-allow-credentials")
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_preflight_for_allowed_origin() {
    let app = create_test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/tools/ping")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        headers.get("access-control-allow-methods").unwrap(),
        "GET, POST, OPTIONS"
    );
    let allow_headers = headers
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allow_headers.contains("X-Correlation-ID"));
    assert!(allow_headers.contains("X-Idempotency-Key"));
}

#[tokio::test]
async fn test_preflight_for_blocked_origin() {
    let app = create_test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/tools/ping")
        .header("origin", "https://evil.example")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "CORS_BLOCKED");
}

#[tokio::test]
async fn test_unmatched_route_is_not_found() {
    let app = create_test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/no/such/route")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/no/such/route"));
}

#[tokio::test]
async fn test_unknown_sse_connection_falls_back_to_json() {
    let app = create_test_app();
    let headers = [("x-sse-connection-id", "no-such-connection")];
    let (status, _, body) = post_tool(&app, "ping", json!({ "name": "Nick" }), &headers).await;

    // The connection is unknown, so the result comes back as plain JSON.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello, Nick!");
}
