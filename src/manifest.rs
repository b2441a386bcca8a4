//! Discovery documents: the MCP manifest, the root metadata, and the tool
//! listing.
//!
//! The homepage URL prefers the configured server URL, then the request's
//! `Host` header, then a localhost fallback on the advertised HTTPS port.

use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::tools::schema;

/// Server identifier advertised in the manifest and MCP handshake.
pub const SERVER_NAME: &str = "partner-integration-gateway";

/// Server description advertised in the manifest.
pub const SERVER_DESCRIPTION: &str =
    "MCP tools for partner commerce and payment integrations";

/// Resolves the externally reachable base URL.
pub fn homepage(config: &GatewayConfig, host: Option<&str>) -> String {
    if let Some(server_url) = &config.server_url {
        return server_url.clone();
    }
    if let Some(host) = host {
        return format!("https://{host}");
    }
    format!("https://localhost:{}", config.https_port)
}

/// Full MCP manifest: identity plus the tool list with parameter schemas.
pub fn mcp_manifest(config: &GatewayConfig, host: Option<&str>) -> Value {
    let tools: Vec<Value> = schema::descriptors()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": schema::input_schema(tool.name),
            })
        })
        .collect();

    json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVER_DESCRIPTION,
        "homepage": homepage(config, host),
        "tools": tools,
    })
}

/// Root discovery metadata pointing at the manifest and SSE endpoint.
pub fn discovery_metadata(config: &GatewayConfig, host: Option<&str>) -> Value {
    json!({
        "mcp": true,
        "name": SERVER_NAME,
        "description": SERVER_DESCRIPTION,
        "manifest": "/mcp-manifest.json",
        "sse": "/sse",
        "homepage": homepage(config, host),
    })
}

/// Tool listing served at `/tools`: descriptors with `inputSchema`.
pub fn tool_list() -> Value {
    let tools: Vec<Value> = schema::descriptors()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": schema::input_schema(tool.name),
            })
        })
        .collect();

    json!({ "tools": tools })
}
