//! Agent runtime error taxonomy.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::provider::ProviderError;

/// Errors surfaced by the agent runtime's public operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model or tool-provider binding could not be established. Fatal to
    /// `initialize`/`switch_provider`; no partial handle is retained.
    #[error("initialization failed: {reason}")]
    Initialization { reason: String },

    /// An operation needing a live binding was called before `initialize`.
    #[error("runtime is not initialized")]
    NotInitialized,

    /// A query (or provider switch) was issued while another operation held
    /// the runtime. Recoverable — retry once the in-flight query settles.
    #[error("runtime is busy with another operation")]
    Busy,

    /// A single tool call failed and the query was not able to continue.
    #[error("tool execution failed: {reason}")]
    ToolExecution { reason: String },

    /// The tool-call loop hit its iteration bound.
    #[error("tool-call loop exceeded {max_rounds} rounds")]
    LoopLimitExceeded { max_rounds: usize },

    /// The per-query deadline elapsed at a model or tool suspension point.
    #[error("query timed out after {timeout_secs}s")]
    QueryTimeout { timeout_secs: u64 },

    /// The query was cancelled via the runtime's cancellation token.
    #[error("query cancelled")]
    Cancelled,

    /// Malformed snapshot on restore. Restores fail closed — a bad snapshot
    /// never silently becomes an empty conversation.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Model provider failure that terminated the current query.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<GatewayError> for AgentError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Connection { .. } | GatewayError::Config { .. } => {
                AgentError::Initialization {
                    reason: e.to_string(),
                }
            }
            other => AgentError::ToolExecution {
                reason: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        AgentError::Serialization {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_connection_maps_to_initialization() {
        let err: AgentError = GatewayError::Connection {
            name: "notes".into(),
            reason: "spawn failed".into(),
        }
        .into();
        assert!(matches!(err, AgentError::Initialization { .. }));
    }

    #[test]
    fn gateway_tool_failure_maps_to_tool_execution() {
        let err: AgentError = GatewayError::ToolExecution {
            tool: "notes.list_files".into(),
            reason: "boom".into(),
        }
        .into();
        assert!(matches!(err, AgentError::ToolExecution { .. }));
    }
}
