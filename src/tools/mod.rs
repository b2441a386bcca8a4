//! Tool implementations and their contracts.
//!
//! This module contains:
//! - the schema registry (tool descriptors, input/output validation)
//! - the commerce collaborator client (product search)
//! - the payment collaborator client (checkout sessions, payment status)

use thiserror::Error;

pub mod catalog;
pub mod payments;
pub mod schema;

pub use catalog::CatalogClient;
pub use payments::PaymentsClient;
pub use schema::{descriptor, descriptors, validate_input, validate_output, ToolDescriptor};

/// Typed failure raised by the collaborator-calling code.
///
/// Classification downstream is a match on these tags; collaborator failure
/// text is never inspected to decide a category.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The collaborator call timed out.
    #[error("request timeout")]
    Timeout,

    /// The collaborator answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status reported by the collaborator.
        status: u16,
        message: String,
    },

    /// The collaborator could not be reached at all.
    #[error("{message}")]
    Transport { message: String },

    /// The real collaborator branch was selected but credentials are absent.
    #[error("{0}")]
    NotConfigured(String),
}

impl UpstreamError {
    /// Maps a client error from the HTTP stack onto a typed variant.
    pub(crate) fn from_http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}
