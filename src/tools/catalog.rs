//! Commerce collaborator: product search.
//!
//! In demo mode the search is served from deterministic mock data. The real
//! branch calls the commerce store's product listing endpoint and filters
//! client-side, since the listing API has no text search of its own.

use serde_json::{json, Value};
use tracing::debug;

use crate::config::CommerceConfig;
use crate::helpers::now_iso;
use crate::tools::schema::SearchProductsParams;
use crate::tools::UpstreamError;

/// Mock result sets are capped at this many products.
const DEMO_RESULT_CAP: u32 = 5;

/// Upper bound on products fetched for client-side filtering.
const FETCH_CAP: u32 = 250;

/// Client for the commerce platform.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    store_url: Option<String>,
    access_token: Option<String>,
    api_version: String,
}

impl CatalogClient {
    pub fn new(config: &CommerceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            store_url: config.store_url.clone(),
            access_token: config.access_token.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// Searches products, returning `{ok, products, total, query}`.
    pub async fn search_products(
        &self,
        params: &SearchProductsParams,
        demo_mode: bool,
    ) -> Result<Value, UpstreamError> {
        if demo_mode {
            return Ok(mock_search(params));
        }

        let (store_url, access_token) = match (&self.store_url, &self.access_token) {
            (Some(store_url), Some(access_token)) => (store_url, access_token),
            _ => {
                return Err(UpstreamError::NotConfigured(
                    "Commerce credentials not configured. Set COMMERCE_STORE_URL and \
                     COMMERCE_ACCESS_TOKEN environment variables, or use DEMO_MODE=true for mocks."
                        .to_string(),
                ))
            }
        };

        // The listing endpoint has no text search; over-fetch and filter here.
        let fetch_limit = (params.limit.saturating_mul(5)).min(FETCH_CAP);
        let url = format!(
            "{}/api/{}/products.json?limit={}",
            store_url.trim_end_matches('/'),
            self.api_version,
            fetch_limit,
        );

        debug!(%url, query = %params.query, "commerce product search");

        let response = self
            .http
            .get(&url)
            .header("X-Access-Token", access_token)
            .send()
            .await
            .map_err(UpstreamError::from_http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: format!("commerce API responded {}: {}", status.as_u16(), body),
            });
        }

        let data: Value = response.json().await.map_err(UpstreamError::from_http)?;
        let products = data
            .get("products")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let query = params.query.to_lowercase();
        let matched: Vec<Value> = products
            .iter()
            .filter(|product| {
                ["title", "vendor", "product_type"].iter().any(|field| {
                    product
                        .get(field)
                        .and_then(Value::as_str)
                        .map(|value| value.to_lowercase().contains(&query))
                        .unwrap_or(false)
                })
            })
            .take(params.limit as usize)
            .map(transform_product)
            .collect();

        Ok(json!({
            "ok": true,
            "products": matched,
            "total": matched.len(),
            "query": params.query,
        }))
    }
}

/// Reshapes a raw store product into the gateway's product shape.
fn transform_product(product: &Value) -> Value {
    let variants: Vec<Value> = product
        .get("variants")
        .and_then(Value::as_array)
        .map(|variants| {
            variants
                .iter()
                .map(|variant| {
                    json!({
                        "id": id_string(variant.get("id")),
                        "title": variant.get("title").cloned().unwrap_or(Value::Null),
                        "price": variant.get("price").cloned().unwrap_or(Value::Null),
                        "sku": variant.get("sku").cloned().unwrap_or(Value::Null),
                        "inventoryQuantity": variant
                            .get("inventory_quantity")
                            .cloned()
                            .unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let first_price = product
        .get("variants")
        .and_then(Value::as_array)
        .and_then(|variants| variants.first())
        .and_then(|variant| variant.get("price"))
        .cloned()
        .unwrap_or_else(|| json!("0.00"));

    json!({
        "id": id_string(product.get("id")),
        "title": product.get("title").cloned().unwrap_or(Value::Null),
        "price": first_price,
        "vendor": product.get("vendor").cloned().unwrap_or_else(|| json!("")),
        "productType": product.get("product_type").cloned().unwrap_or_else(|| json!("")),
        "createdAt": product.get("created_at").cloned().unwrap_or(Value::Null),
        "handle": product.get("handle").cloned().unwrap_or(Value::Null),
        "status": product.get("status").cloned().unwrap_or(Value::Null),
        "variants": variants,
    })
}

/// Store IDs may arrive as numbers or strings; both become plain strings.
fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Deterministic demo results: up to five products echoing the query.
fn mock_search(params: &SearchProductsParams) -> Value {
    let count = params.limit.min(DEMO_RESULT_CAP);
    let products: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": format!("prod_{i}"),
                "title": format!("Mock Product {i} - {}", params.query),
                "price": format!("{:.2}", 19.99 + f64::from(i - 1) * 10.0),
                "vendor": "Demo Vendor",
                "productType": "Demo Type",
                "createdAt": now_iso(),
            })
        })
        .collect();

    json!({
        "ok": true,
        "products": products,
        "total": DEMO_RESULT_CAP,
        "query": params.query,
    })
}
