//! Model provider error types.

use thiserror::Error;

/// Errors that can occur while resolving or calling a model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The model endpoint did not respond within the configured timeout.
    #[error("model call timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The endpoint answered but the body did not parse as a completion.
    #[error("malformed model response: {reason}")]
    MalformedResponse { reason: String },

    /// Provider settings error (bad endpoint, missing model name).
    #[error("config error: {reason}")]
    Config { reason: String },
}
