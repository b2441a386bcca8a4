//! Idempotency key handling for mutating tool calls.
//!
//! When a caller supplies `X-Idempotency-Key`, the identifier derived for the
//! created resource embeds that key, so retries with the same key are
//! recognizable as the same logical operation. Without a key, a time-based
//! identifier is used instead.

use chrono::Utc;

/// Header carrying the caller-supplied idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

/// Derives a deterministic resource identifier from an idempotency key.
///
/// Same key, same identifier. Without a key the identifier is time-based and
/// therefore fresh per call.
pub fn derive_identifier(prefix: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{prefix}_{key}"),
        None => format!("{prefix}_{}", Utc::now().timestamp_millis()),
    }
}
