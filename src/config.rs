//! Gateway configuration.
//!
//! All deployment-time settings are read from the environment exactly once at
//! startup and frozen into an immutable [`GatewayConfig`] that is injected
//! into the application state. Changing origins or credentials requires a
//! process restart.

use std::env;

/// Credentials and endpoint for the commerce platform collaborator.
#[derive(Debug, Clone, Default)]
pub struct CommerceConfig {
    /// Base URL of the commerce store API, e.g. `https://store.example.com`.
    pub store_url: Option<String>,
    /// Access token sent with every commerce API request.
    pub access_token: Option<String>,
    /// Commerce API version segment used when building request paths.
    pub api_version: String,
}

/// Credentials and endpoint for the payment platform collaborator.
#[derive(Debug, Clone, Default)]
pub struct PaymentConfig {
    /// Base URL of the payment platform API.
    pub api_url: Option<String>,
    /// Secret key used as a bearer token.
    pub secret_key: Option<String>,
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// When `true`, tools serve deterministic mocks instead of calling the
    /// commerce/payment collaborators.
    pub demo_mode: bool,

    /// Port the HTTP listener binds to.
    pub http_port: u16,

    /// Advertised HTTPS port (TLS termination happens in front of the
    /// gateway; the port is still needed for origin and homepage defaults).
    pub https_port: u16,

    /// Externally reachable base URL, used as the manifest homepage when set.
    pub server_url: Option<String>,

    /// Frontend origin added to the allow-list, and default base for
    /// checkout success/cancel URLs.
    pub frontend_url: Option<String>,

    /// Raw comma-separated extra origins; normalized by the origin guard.
    pub extra_origins: Vec<String>,

    /// Commerce collaborator settings.
    pub commerce: CommerceConfig,

    /// Payment collaborator settings.
    pub payment: PaymentConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            http_port: 8080,
            https_port: 8443,
            server_url: None,
            frontend_url: None,
            extra_origins: Vec::new(),
            commerce: CommerceConfig {
                api_version: default_commerce_api_version(),
                ..CommerceConfig::default()
            },
            payment: PaymentConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            demo_mode: env_flag("DEMO_MODE"),
            http_port: env_port(&["HTTP_PORT", "PORT"], 8080),
            https_port: env_port(&["HTTPS_PORT"], 8443),
            server_url: env_string("MCP_SERVER_URL"),
            frontend_url: env_string("FRONTEND_URL"),
            extra_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_owned)
                .collect(),
            commerce: CommerceConfig {
                store_url: env_string("COMMERCE_STORE_URL"),
                access_token: env_string("COMMERCE_ACCESS_TOKEN"),
                api_version: env_string("COMMERCE_API_VERSION")
                    .unwrap_or_else(default_commerce_api_version),
            },
            payment: PaymentConfig {
                api_url: env_string("PAYMENT_API_URL"),
                secret_key: env_string("PAYMENT_SECRET_KEY"),
            },
        }
    }
}

fn default_commerce_api_version() -> String {
    "2024-10".to_string()
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|value| value == "true").unwrap_or(false)
}

fn env_port(names: &[&str], default: u16) -> u16 {
    names
        .iter()
        .find_map(|name| env::var(name).ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
