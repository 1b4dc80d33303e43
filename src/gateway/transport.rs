//! JSON-RPC over stdio transport.
//!
//! Low-level communication with a tool-provider child process: one JSON
//! object per line on stdin/stdout, request-response matched by `id`.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use super::errors::GatewayError;
use super::types::{JsonRpcRequest, JsonRpcResponse};

/// Bi-directional JSON-RPC transport over a child process's stdio.
///
/// Request IDs are per-transport, so two providers never share a counter.
#[derive(Debug)]
pub struct StdioTransport {
    provider: String,
    next_id: AtomicU64,
    writer: Mutex<ChildStdin>,
    reader: Mutex<BufReader<ChildStdout>>,
}

impl StdioTransport {
    pub fn new(provider: &str, stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            provider: provider.to_string(),
            next_id: AtomicU64::new(1),
            writer: Mutex::new(stdin),
            reader: Mutex::new(BufReader::new(stdout)),
        }
    }

    fn transport_err(&self, reason: String) -> GatewayError {
        GatewayError::Transport {
            provider: self.provider.clone(),
            reason,
        }
    }

    /// Send a request and wait for the response with the matching `id`.
    ///
    /// Lines that are not valid JSON-RPC responses (provider log noise) and
    /// responses for other ids are skipped.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let mut json = serde_json::to_string(&req)
            .map_err(|e| self.transport_err(format!("failed to serialize request: {e}")))?;
        json.push('\n');

        {
            let mut writer = self.writer.lock().await;
            writer
                .write_all(json.as_bytes())
                .await
                .map_err(|e| self.transport_err(format!("failed to write to stdin: {e}")))?;
            writer
                .flush()
                .await
                .map_err(|e| self.transport_err(format!("failed to flush stdin: {e}")))?;
        }

        let mut line = String::new();
        let mut reader = self.reader.lock().await;

        loop {
            line.clear();
            let n = reader
                .read_line(&mut line)
                .await
                .map_err(|e| self.transport_err(format!("failed to read from stdout: {e}")))?;

            if n == 0 {
                return Err(self.transport_err(
                    "provider stdout closed (process may have exited)".to_string(),
                ));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcResponse>(trimmed) {
                Ok(resp) if resp.id == id => return Ok(resp),
                _ => continue,
            }
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), GatewayError> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });

        let mut json = serde_json::to_string(&notification)
            .map_err(|e| self.transport_err(format!("failed to serialize notification: {e}")))?;
        json.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(json.as_bytes())
            .await
            .map_err(|e| self.transport_err(format!("failed to write notification: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| self.transport_err(format!("failed to flush notification: {e}")))?;

        Ok(())
    }
}

/// Extract the result from a response, mapping JSON-RPC errors to
/// `GatewayError::ToolExecution` context-free; callers add the tool name.
pub fn extract_result(
    provider: &str,
    response: JsonRpcResponse,
) -> Result<serde_json::Value, GatewayError> {
    if let Some(err) = response.error {
        return Err(GatewayError::ToolExecution {
            tool: provider.to_string(),
            reason: format!("[{}] {}", err.code, err.message),
        });
    }

    response.result.ok_or_else(|| GatewayError::Transport {
        provider: provider.to_string(),
        reason: "response missing both result and error".to_string(),
    })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
