//! Tool Gateway error types.

use thiserror::Error;

/// Errors that can occur while connecting to or invoking tool providers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A provider process could not be started or did not complete the
    /// handshake. Fatal to `connect` — no partial catalog is ever returned.
    #[error("failed to connect provider '{name}': {reason}")]
    Connection { name: String, reason: String },

    /// JSON-RPC communication error (malformed message, I/O error).
    #[error("transport error for provider '{provider}': {reason}")]
    Transport { provider: String, reason: String },

    /// A single tool call failed on the provider side. Recoverable — the
    /// runtime surfaces it to the model as an observation.
    #[error("tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    /// Tool not present in the aggregated catalog.
    #[error("unknown tool: '{name}'")]
    UnknownTool { name: String },

    /// Tool call arguments failed schema validation.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// A tool call exceeded the per-call timeout.
    #[error("tool call '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    /// Provider manifest error (missing provider, bad manifest file).
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl GatewayError {
    /// Whether the runtime may keep the current query alive after this error.
    ///
    /// Only per-call failures are recoverable; everything else indicates a
    /// broken binding.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GatewayError::ToolExecution { .. }
                | GatewayError::UnknownTool { .. }
                | GatewayError::InvalidArguments { .. }
                | GatewayError::Timeout { .. }
        )
    }
}
