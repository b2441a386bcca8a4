//! Payment collaborator: checkout sessions and payment status.
//!
//! Two checkout variants are exposed: the item-based variant builds a session
//! from price references and honors the caller's idempotency key; the simple
//! variant builds a single line item from a product name and a decimal price.
//! Demo mode serves deterministic mocks for all operations.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::PaymentConfig;
use crate::helpers::now_iso;
use crate::idempotency;
use crate::tools::schema::{CheckoutSessionParams, SimpleCheckoutParams};
use crate::tools::UpstreamError;

/// Prefix of mock checkout session identifiers.
const MOCK_SESSION_PREFIX: &str = "cs_mock";

/// Header the payment platform uses to deduplicate session creation.
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Client for the payment platform.
#[derive(Debug, Clone)]
pub struct PaymentsClient {
    http: reqwest::Client,
    api_url: Option<String>,
    secret_key: Option<String>,
    site_url: Option<String>,
}

impl PaymentsClient {
    pub fn new(config: &PaymentConfig, site_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            secret_key: config.secret_key.clone(),
            site_url,
        }
    }

    /// Creates a checkout session from price references.
    ///
    /// The derived session identifier embeds the idempotency key when one is
    /// supplied, and the key is echoed back in the result.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
        idempotency_key: Option<&str>,
        demo_mode: bool,
    ) -> Result<Value, UpstreamError> {
        if demo_mode {
            let session_id = idempotency::derive_identifier(MOCK_SESSION_PREFIX, idempotency_key);
            return Ok(session_result(
                &session_id,
                &format!("https://checkout.example.com/pay/{session_id}"),
                params,
                idempotency_key,
            ));
        }

        let (api_url, secret_key) = self.credentials()?;

        let mut form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), params.success_url.clone()),
            ("cancel_url".to_string(), params.cancel_url.clone()),
        ];
        for (index, item) in params.items.iter().enumerate() {
            form.push((format!("line_items[{index}][price]"), item.price_id.clone()));
            form.push((
                format!("line_items[{index}][quantity]"),
                item.quantity.to_string(),
            ));
        }
        if let Some(key) = idempotency_key {
            form.push(("client_reference_id".to_string(), key.to_string()));
        }

        debug!(items = params.items.len(), "creating checkout session");

        let mut request = self
            .http
            .post(format!("{api_url}/v1/checkout/sessions"))
            .bearer_auth(secret_key)
            .form(&form);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }

        let session = send(request).await?;
        let session_id = string_field(&session, "id");
        let url = string_field(&session, "url");
        Ok(session_result(&session_id, &url, params, idempotency_key))
    }

    /// Creates a checkout session from a product name and decimal price.
    pub async fn create_simple_session(
        &self,
        params: &SimpleCheckoutParams,
        demo_mode: bool,
    ) -> Result<Value, UpstreamError> {
        if demo_mode {
            return Ok(json!({
                "checkout_url": "https://example.com/demo-checkout",
                "session_id": "demo_session_123",
                "payment_intent": "demo_pi_123",
            }));
        }

        let (api_url, secret_key) = self.credentials()?;

        let site_url = self
            .site_url
            .clone()
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        let success_url = params
            .success_url
            .clone()
            .unwrap_or_else(|| format!("{site_url}/success?session_id={{CHECKOUT_SESSION_ID}}"));
        let cancel_url = params
            .cancel_url
            .clone()
            .unwrap_or_else(|| format!("{site_url}/cancel"));

        // The platform expects amounts in the smallest currency unit.
        let unit_amount = (params.price * 100.0).round() as i64;

        let form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), success_url),
            ("cancel_url".to_string(), cancel_url),
            (
                "line_items[0][price_data][currency]".to_string(),
                params.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                params.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                unit_amount.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        let session = send(
            self.http
                .post(format!("{api_url}/v1/checkout/sessions"))
                .bearer_auth(secret_key)
                .form(&form),
        )
        .await?;

        Ok(json!({
            "checkout_url": string_field(&session, "url"),
            "session_id": string_field(&session, "id"),
            "payment_intent": session.get("payment_intent").cloned().unwrap_or(Value::Null),
        }))
    }

    /// Retrieves status, amount, and currency for a payment intent.
    pub async fn get_payment_status(
        &self,
        payment_intent_id: &str,
        demo_mode: bool,
    ) -> Result<Value, UpstreamError> {
        if demo_mode {
            return Ok(json!({
                "status": "succeeded",
                "amount": 2999,
                "currency": "usd",
            }));
        }

        let (api_url, secret_key) = self.credentials()?;

        let intent = send(
            self.http
                .get(format!("{api_url}/v1/payment_intents/{payment_intent_id}"))
                .bearer_auth(secret_key),
        )
        .await?;

        Ok(json!({
            "status": string_field(&intent, "status"),
            "amount": intent.get("amount").cloned().unwrap_or(json!(0)),
            "currency": string_field(&intent, "currency"),
        }))
    }

    fn credentials(&self) -> Result<(&str, &str), UpstreamError> {
        match (&self.api_url, &self.secret_key) {
            (Some(api_url), Some(secret_key)) => {
                Ok((api_url.trim_end_matches('/'), secret_key.as_str()))
            }
            _ => Err(UpstreamError::NotConfigured(
                "Payment credentials not configured. Set PAYMENT_API_URL and PAYMENT_SECRET_KEY \
                 environment variables, or use DEMO_MODE=true for mocks."
                    .to_string(),
            )),
        }
    }
}

/// Sends a payment API request and decodes the JSON body, mapping non-success
/// statuses onto the typed upstream error.
async fn send(request: reqwest::RequestBuilder) -> Result<Value, UpstreamError> {
    let response = request.send().await.map_err(UpstreamError::from_http)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            message: format!("payment API responded {}: {}", status.as_u16(), body),
        });
    }
    response.json().await.map_err(UpstreamError::from_http)
}

/// Builds the item-based checkout session result, echoing the idempotency
/// key only when one was supplied.
fn session_result(
    session_id: &str,
    url: &str,
    params: &CheckoutSessionParams,
    idempotency_key: Option<&str>,
) -> Value {
    let mut result = Map::new();
    result.insert("ok".to_string(), json!(true));
    result.insert("sessionId".to_string(), json!(session_id));
    result.insert("url".to_string(), json!(url));
    result.insert("items".to_string(), json!(params.items));
    result.insert("successUrl".to_string(), json!(params.success_url));
    result.insert("cancelUrl".to_string(), json!(params.cancel_url));
    result.insert("createdAt".to_string(), json!(now_iso()));
    if let Some(key) = idempotency_key {
        result.insert("idempotencyKey".to_string(), json!(key));
    }
    Value::Object(result)
}

fn string_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::CheckoutItem;

    fn demo_client() -> PaymentsClient {
        PaymentsClient::new(&PaymentConfig::default(), None)
    }

    fn checkout_params() -> CheckoutSessionParams {
        CheckoutSessionParams {
            items: vec![CheckoutItem {
                price_id: "price_123".to_string(),
                quantity: 1,
            }],
            success_url: "https://example.com/success".to_string(),
            cancel_url: "https://example.com/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn test_demo_session_embeds_idempotency_key() {
        let client = demo_client();
        let params = checkout_params();

        let first = client
            .create_checkout_session(&params, Some("abc123"), true)
            .await
            .unwrap();
        let second = client
            .create_checkout_session(&params, Some("abc123"), true)
            .await
            .unwrap();

        assert_eq!(first["sessionId"], "cs_mock_abc123");
        assert_eq!(first["sessionId"], second["sessionId"]);
        assert_eq!(first["idempotencyKey"], "abc123");
        assert!(first["url"]
            .as_str()
            .unwrap()
            .ends_with("/pay/cs_mock_abc123"));
    }

    #[tokio::test]
    async fn test_demo_session_without_key_omits_echo() {
        let client = demo_client();
        let result = client
            .create_checkout_session(&checkout_params(), None, true)
            .await
            .unwrap();

        assert!(result["sessionId"].as_str().unwrap().starts_with("cs_mock_"));
        assert!(result.get("idempotencyKey").is_none());
        assert_eq!(result["items"][0]["priceId"], "price_123");
    }

    #[tokio::test]
    async fn test_demo_simple_session_is_fixed() {
        let client = demo_client();
        let params = SimpleCheckoutParams {
            product_name: "Mug".to_string(),
            price: 49.99,
            currency: "usd".to_string(),
            success_url: None,
            cancel_url: None,
        };
        let result = client.create_simple_session(&params, true).await.unwrap();

        assert_eq!(result["session_id"], "demo_session_123");
        assert_eq!(result["payment_intent"], "demo_pi_123");
        assert_eq!(result["checkout_url"], "https://example.com/demo-checkout");
    }

    #[tokio::test]
    async fn test_demo_payment_status() {
        let client = demo_client();
        let result = client.get_payment_status("pi_1", true).await.unwrap();

        assert_eq!(result["status"], "succeeded");
        assert_eq!(result["amount"], 2999);
        assert_eq!(result["currency"], "usd");
    }

    #[tokio::test]
    async fn test_real_branch_requires_credentials() {
        let client = demo_client();
        let err = client
            .create_checkout_session(&checkout_params(), None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured(_)));
    }
}
