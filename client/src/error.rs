//! Error types for the booking backend client.

use thiserror::Error;

/// Errors that can occur when calling the booking backend.
///
/// `Clone` so a single in-flight request's outcome can be shared with every
/// caller that joined it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Client could not be constructed (TLS or configuration failure)
    #[error("Client configuration failed: {0}")]
    Configuration(String),

    /// The request never completed (connectivity, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Session cookie missing or expired; the caller should re-authenticate
    #[error("Unauthorized - session missing or expired")]
    Unauthorized,

    /// Backend answered with a non-success status
    #[error("HTTP error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Server-provided error message, or a generic one
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
