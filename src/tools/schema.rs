//! Schema registry: per-tool parameter and result contracts.
//!
//! Each tool declares an input schema (also served in the manifest and the
//! `/tools` listing) and validated, typed parameters. Validation collects one
//! message per violated constraint, in declaration order. Output validation
//! is symmetric: tool results are re-checked before a success envelope is
//! emitted, and a mismatch is treated as a programming error, never as a
//! client fault.

use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

// =============================================================================
// Tool names
// =============================================================================

pub const PING: &str = "ping";
pub const SEARCH_PRODUCTS: &str = "searchProducts";
pub const CREATE_CHECKOUT_SESSION: &str = "createCheckoutSession";
pub const CREATE_SIMPLE_CHECKOUT_SESSION: &str = "createSimpleCheckoutSession";
pub const GET_PAYMENT_STATUS: &str = "getPaymentStatus";

/// Default result count for product search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Default currency for the simple checkout variant.
pub const DEFAULT_CURRENCY: &str = "usd";

// =============================================================================
// Descriptors
// =============================================================================

/// Static description of a registered tool.
#[derive(Debug)]
pub struct ToolDescriptor {
    /// Unique tool name, stable across transports.
    pub name: &'static str,
    /// Human-readable description served in the manifest.
    pub description: &'static str,
    /// Whether the tool mutates state (idempotency keys apply).
    pub mutating: bool,
}

static DESCRIPTORS: [ToolDescriptor; 5] = [
    ToolDescriptor {
        name: PING,
        description: "Connectivity test that returns a greeting",
        mutating: false,
    },
    ToolDescriptor {
        name: SEARCH_PRODUCTS,
        description: "Search products in the commerce store",
        mutating: false,
    },
    ToolDescriptor {
        name: CREATE_CHECKOUT_SESSION,
        description: "Create a checkout session from price references",
        mutating: true,
    },
    ToolDescriptor {
        name: CREATE_SIMPLE_CHECKOUT_SESSION,
        description: "Create a checkout session from a product name and price",
        mutating: true,
    },
    ToolDescriptor {
        name: GET_PAYMENT_STATUS,
        description: "Get status, amount, and currency for a payment intent",
        mutating: false,
    },
];

/// All registered tools, in registration order.
pub fn descriptors() -> &'static [ToolDescriptor] {
    &DESCRIPTORS
}

/// Looks up a tool by name.
pub fn descriptor(name: &str) -> Option<&'static ToolDescriptor> {
    DESCRIPTORS.iter().find(|tool| tool.name == name)
}

/// JSON schema for the tool's input parameters.
pub fn input_schema(name: &str) -> Value {
    match name {
        PING => json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Name to greet" },
            },
        }),
        SEARCH_PRODUCTS => json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (matches product title, vendor, and type)",
                },
                "limit": {
                    "type": "number",
                    "default": DEFAULT_SEARCH_LIMIT,
                    "description": "Maximum number of products to return",
                },
            },
        }),
        CREATE_CHECKOUT_SESSION => json!({
            "type": "object",
            "required": ["items", "successUrl", "cancelUrl"],
            "properties": {
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["priceId", "quantity"],
                        "properties": {
                            "priceId": { "type": "string" },
                            "quantity": { "type": "number" },
                        },
                    },
                },
                "successUrl": { "type": "string" },
                "cancelUrl": { "type": "string" },
            },
        }),
        CREATE_SIMPLE_CHECKOUT_SESSION => json!({
            "type": "object",
            "required": ["productName", "price"],
            "properties": {
                "productName": {
                    "type": "string",
                    "description": "Name of the product being purchased",
                },
                "price": {
                    "type": "number",
                    "description": "Price as a decimal currency amount (e.g. 49.99)",
                },
                "currency": {
                    "type": "string",
                    "default": DEFAULT_CURRENCY,
                    "description": "Currency code (ISO 4217)",
                },
                "successUrl": { "type": "string" },
                "cancelUrl": { "type": "string" },
            },
        }),
        GET_PAYMENT_STATUS => json!({
            "type": "object",
            "required": ["paymentIntentId"],
            "properties": {
                "paymentIntentId": { "type": "string", "description": "Payment intent ID" },
            },
        }),
        _ => json!({ "type": "object" }),
    }
}

// =============================================================================
// Validated parameters
// =============================================================================

#[derive(Debug)]
pub struct PingParams {
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct SearchProductsParams {
    pub query: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutItem {
    #[serde(rename = "priceId")]
    pub price_id: String,
    pub quantity: u32,
}

#[derive(Debug)]
pub struct CheckoutSessionParams {
    pub items: Vec<CheckoutItem>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug)]
pub struct SimpleCheckoutParams {
    pub product_name: String,
    pub price: f64,
    pub currency: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug)]
pub struct PaymentStatusParams {
    pub payment_intent_id: String,
}

/// Parameters that passed input validation, ready for execution.
#[derive(Debug)]
pub enum ValidParams {
    Ping(PingParams),
    SearchProducts(SearchProductsParams),
    CreateCheckoutSession(CheckoutSessionParams),
    CreateSimpleCheckoutSession(SimpleCheckoutParams),
    GetPaymentStatus(PaymentStatusParams),
}

// =============================================================================
// Input validation
// =============================================================================

/// Validates raw parameters against the tool's input schema.
///
/// On failure, returns one message per violated constraint in declaration
/// order. The caller is responsible for tool-name lookup; an unregistered
/// name falls through to an empty-message failure and should not reach here.
pub fn validate_input(tool: &str, raw: &Value) -> Result<ValidParams, Vec<String>> {
    if !raw.is_object() {
        return Err(vec!["params must be an object".to_string()]);
    }

    match tool {
        PING => validate_ping(raw).map(ValidParams::Ping),
        SEARCH_PRODUCTS => validate_search_products(raw).map(ValidParams::SearchProducts),
        CREATE_CHECKOUT_SESSION => {
            validate_checkout_session(raw).map(ValidParams::CreateCheckoutSession)
        }
        CREATE_SIMPLE_CHECKOUT_SESSION => {
            validate_simple_checkout(raw).map(ValidParams::CreateSimpleCheckoutSession)
        }
        GET_PAYMENT_STATUS => validate_payment_status(raw).map(ValidParams::GetPaymentStatus),
        other => Err(vec![format!("no schema registered for tool {other}")]),
    }
}

fn validate_ping(raw: &Value) -> Result<PingParams, Vec<String>> {
    let mut errors = Vec::new();

    let name = match raw.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            errors.push("name must be a string".to_string());
            None
        }
    };

    if errors.is_empty() {
        Ok(PingParams { name })
    } else {
        Err(errors)
    }
}

fn validate_search_products(raw: &Value) -> Result<SearchProductsParams, Vec<String>> {
    let mut errors = Vec::new();

    let query = match raw.get("query") {
        None | Some(Value::Null) => {
            errors.push("query is required".to_string());
            String::new()
        }
        Some(Value::String(query)) if !query.is_empty() => query.clone(),
        Some(_) => {
            errors.push("query must be a non-empty string".to_string());
            String::new()
        }
    };

    let limit = match raw.get("limit") {
        None | Some(Value::Null) => DEFAULT_SEARCH_LIMIT,
        Some(value) => match positive_integer(value) {
            Some(limit) => limit,
            None => {
                errors.push("limit must be a positive integer".to_string());
                DEFAULT_SEARCH_LIMIT
            }
        },
    };

    if errors.is_empty() {
        Ok(SearchProductsParams { query, limit })
    } else {
        Err(errors)
    }
}

fn validate_checkout_session(raw: &Value) -> Result<CheckoutSessionParams, Vec<String>> {
    let mut errors = Vec::new();

    let items = match raw.get("items") {
        None | Some(Value::Null) => {
            errors.push("items is required".to_string());
            Vec::new()
        }
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let mut items = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                let price_id = match entry.get("priceId") {
                    Some(Value::String(id)) if !id.is_empty() => id.clone(),
                    _ => {
                        errors.push(format!(
                            "items[{index}].priceId must be a non-empty string"
                        ));
                        String::new()
                    }
                };
                let quantity = match entry.get("quantity").and_then(positive_integer) {
                    Some(quantity) => quantity,
                    None => {
                        errors.push(format!(
                            "items[{index}].quantity must be a positive integer"
                        ));
                        0
                    }
                };
                items.push(CheckoutItem { price_id, quantity });
            }
            items
        }
        Some(_) => {
            errors.push("items must be a non-empty array".to_string());
            Vec::new()
        }
    };

    let success_url = required_url(raw, "successUrl", &mut errors);
    let cancel_url = required_url(raw, "cancelUrl", &mut errors);

    if errors.is_empty() {
        Ok(CheckoutSessionParams {
            items,
            success_url,
            cancel_url,
        })
    } else {
        Err(errors)
    }
}

fn validate_simple_checkout(raw: &Value) -> Result<SimpleCheckoutParams, Vec<String>> {
    let mut errors = Vec::new();

    let product_name = match raw.get("productName") {
        None | Some(Value::Null) => {
            errors.push("productName is required".to_string());
            String::new()
        }
        Some(Value::String(name)) => name.clone(),
        Some(_) => {
            errors.push("productName must be a string".to_string());
            String::new()
        }
    };

    let currency = match raw.get("currency") {
        None | Some(Value::Null) => DEFAULT_CURRENCY.to_string(),
        Some(Value::String(currency)) => currency.to_lowercase(),
        Some(_) => {
            errors.push("currency must be a string".to_string());
            DEFAULT_CURRENCY.to_string()
        }
    };

    let price = match raw.get("price") {
        None | Some(Value::Null) => {
            errors.push("price is required".to_string());
            0.0
        }
        Some(value) => match value.as_f64() {
            Some(price) if price > 0.0 => {
                // The payment platform rejects amounts below its minimum
                // charge; surface that as a parameter error up front.
                let minimum = if currency == DEFAULT_CURRENCY { 0.5 } else { 0.01 };
                if price < minimum {
                    errors.push(format!(
                        "price must be at least {minimum} {}",
                        currency.to_uppercase()
                    ));
                }
                price
            }
            _ => {
                errors.push("price must be a positive number".to_string());
                0.0
            }
        },
    };

    let success_url = optional_url(raw, "successUrl", &mut errors);
    let cancel_url = optional_url(raw, "cancelUrl", &mut errors);

    if errors.is_empty() {
        Ok(SimpleCheckoutParams {
            product_name,
            price,
            currency,
            success_url,
            cancel_url,
        })
    } else {
        Err(errors)
    }
}

fn validate_payment_status(raw: &Value) -> Result<PaymentStatusParams, Vec<String>> {
    match raw.get("paymentIntentId") {
        None | Some(Value::Null) => Err(vec!["paymentIntentId is required".to_string()]),
        Some(Value::String(id)) if !id.is_empty() => Ok(PaymentStatusParams {
            payment_intent_id: id.clone(),
        }),
        Some(_) => Err(vec![
            "paymentIntentId must be a non-empty string".to_string()
        ]),
    }
}

/// Accepts JSON numbers that are positive integers; rejects zero, negatives,
/// and fractional values.
fn positive_integer(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
}

fn required_url(raw: &Value, field: &str, errors: &mut Vec<String>) -> String {
    match raw.get(field) {
        None | Some(Value::Null) => {
            errors.push(format!("{field} is required"));
            String::new()
        }
        Some(Value::String(value)) if Url::parse(value).is_ok() => value.clone(),
        Some(_) => {
            errors.push(format!("{field} must be a valid URL"));
            String::new()
        }
    }
}

fn optional_url(raw: &Value, field: &str, errors: &mut Vec<String>) -> Option<String> {
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) if Url::parse(value).is_ok() => Some(value.clone()),
        Some(_) => {
            errors.push(format!("{field} must be a valid URL"));
            None
        }
    }
}

// =============================================================================
// Output validation
// =============================================================================

/// Re-validates a tool result against its output schema.
///
/// A mismatch here means the tool produced a malformed result; the caller
/// classifies it as an internal fault, never as a client error.
pub fn validate_output(tool: &str, result: &Value) -> Result<(), String> {
    let checks: &[(&str, fn(&Value) -> bool)] = match tool {
        PING => &[
            ("ok", is_true),
            ("message", Value::is_string),
            ("timestamp", Value::is_string),
        ],
        SEARCH_PRODUCTS => &[
            ("ok", is_true),
            ("products", Value::is_array),
            ("total", Value::is_number),
            ("query", Value::is_string),
        ],
        CREATE_CHECKOUT_SESSION => &[
            ("ok", is_true),
            ("sessionId", Value::is_string),
            ("url", Value::is_string),
            ("items", Value::is_array),
            ("successUrl", Value::is_string),
            ("cancelUrl", Value::is_string),
            ("createdAt", Value::is_string),
        ],
        CREATE_SIMPLE_CHECKOUT_SESSION => &[
            ("checkout_url", Value::is_string),
            ("session_id", Value::is_string),
        ],
        GET_PAYMENT_STATUS => &[
            ("status", Value::is_string),
            ("amount", Value::is_number),
            ("currency", Value::is_string),
        ],
        other => return Err(format!("no output schema registered for tool {other}")),
    };

    for (field, check) in checks {
        let present = result.get(field).map(check).unwrap_or(false);
        if !present {
            return Err(format!("result field {field} is missing or mistyped"));
        }
    }
    Ok(())
}

fn is_true(value: &Value) -> bool {
    value.as_bool() == Some(true)
}
