//! Partner integration gateway.
//!
//! Exposes a fixed set of schema-described tools (ping, product search,
//! checkout-session creation, payment-status lookup) over HTTP/JSON, SSE,
//! and JSON-RPC (MCP) transports. Every invocation runs through the same
//! validation, correlation, and error-classification pipeline regardless of
//! transport.

// Core pipeline
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod idempotency;
pub mod origin;
pub mod state;

// Domain modules
pub mod manifest;
pub mod tools;

// Transports
pub mod mcp;
pub mod router;
pub mod sse;

// Shared helpers
pub mod helpers;
