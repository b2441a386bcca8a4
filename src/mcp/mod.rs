//! Model Context Protocol (MCP) transport.
//!
//! JSON-RPC 2.0 framing over POST `/mcp`, plus the SSE `endpoint` handshake
//! on GET `/mcp`. Tool calls are routed through the same dispatcher as the
//! HTTP transport, so errors carry the same taxonomy codes inside the
//! JSON-RPC error object.

pub mod handlers;
pub mod helpers;
pub mod models;

pub use handlers::routes;
