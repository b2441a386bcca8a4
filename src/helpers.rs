//! Small, pure helper utilities shared across the gateway.
//!
//! Keeping them separated from the domain modules makes the codebase easier
//! to navigate and test.

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};

/// Current instant as an ISO-8601 UTC timestamp with millisecond precision,
/// e.g. `2026-08-06T12:34:56.789Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads a header value as a non-empty string slice.
///
/// Returns `None` when the header is absent, empty, or not valid UTF-8.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
