//! Error types for Chatling
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling. Completion failures are
//! classified coarsely so the orchestrator and the proxy server can pick
//! user-facing copy and HTTP status codes without inspecting raw errors.

use thiserror::Error;

/// Main error type for Chatling operations
///
/// This enum encompasses all possible errors that can occur during
/// completion calls, session persistence, configuration loading, and
/// credential management.
#[derive(Error, Debug)]
pub enum ChatlingError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation failures (empty or otherwise unusable message)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication rejected by the provider (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request refused by the provider (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Provider rate limit hit (HTTP 429), retries exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-side failure (HTTP 5xx), retries exhausted
    #[error("Server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code returned by the provider
        status: u16,
        /// Additional message from the provider, if any
        message: String,
    },

    /// Network-level failure: connect error, timeout, broken transfer
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Provider-related errors that fit no finer classification
    #[error("Provider error: {0}")]
    Provider(String),

    /// Session storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// A completion request is already in flight for this conversation
    #[error("A request is already in flight; wait for it to finish")]
    RequestInFlight,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Chatling operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Extract the `ChatlingError` classification from an anyhow error chain
///
/// Returns `None` when the chain contains no `ChatlingError`, in which case
/// callers should treat the failure as generic.
///
/// # Examples
///
/// ```
/// use chatling::error::{classify, ChatlingError};
///
/// let err = anyhow::Error::new(ChatlingError::RateLimited("slow down".into()));
/// assert!(matches!(classify(&err), Some(ChatlingError::RateLimited(_))));
/// ```
pub fn classify(err: &anyhow::Error) -> Option<&ChatlingError> {
    err.downcast_ref::<ChatlingError>()
}
