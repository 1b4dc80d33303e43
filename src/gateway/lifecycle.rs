//! Provider process lifecycle.
//!
//! Spawns tool-provider child processes, performs the `initialize` +
//! `tools/list` handshake, and shuts them down gracefully. Each provider is
//! a separate OS process speaking JSON-RPC over stdio.

use std::time::Duration;

use tokio::process::{Child, Command};

use super::errors::GatewayError;
use super::transport::{extract_result, StdioTransport};
use super::types::{InitializeResult, ServerConfig, ToolDescriptor, ToolsListResult};

/// Timeout for the initialize + tools/list handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for graceful shutdown before force-killing.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ─── ManagedProvider ────────────────────────────────────────────────────────

/// A running tool-provider process with its transport and advertised tools.
#[derive(Debug)]
pub struct ManagedProvider {
    pub name: String,
    process: Child,
    pub transport: StdioTransport,
    pub tools: Vec<ToolDescriptor>,
}

impl ManagedProvider {
    /// Gracefully shut the provider down: notify, wait briefly, then kill.
    pub async fn shutdown(&mut self) {
        let _ = self.transport.notify("shutdown", None).await;

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.process.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(provider = %self.name, ?status, "provider exited");
            }
            _ => {
                let _ = self.process.kill().await;
                tracing::debug!(provider = %self.name, "provider force-killed");
            }
        }
    }
}

// ─── Spawning ───────────────────────────────────────────────────────────────

/// Spawn one provider process and complete the discovery handshake.
pub async fn spawn_provider(
    name: &str,
    config: &ServerConfig,
) -> Result<ManagedProvider, GatewayError> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args);

    for (key, value) in &config.env {
        cmd.env(key, value);
    }
    if let Some(ref dir) = config.cwd {
        cmd.current_dir(dir);
    }

    cmd.stdin(std::process::Stdio::piped());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| GatewayError::Connection {
        name: name.to_string(),
        reason: format!("failed to spawn '{}': {e}", config.command),
    })?;

    let stdin = child.stdin.take().ok_or_else(|| GatewayError::Connection {
        name: name.to_string(),
        reason: "failed to capture stdin".into(),
    })?;
    let stdout = child.stdout.take().ok_or_else(|| GatewayError::Connection {
        name: name.to_string(),
        reason: "failed to capture stdout".into(),
    })?;
    let stderr_handle = child.stderr.take();

    let transport = StdioTransport::new(name, stdin, stdout);

    let tools = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&transport, name)).await {
        Ok(Ok(tools)) => tools,
        Ok(Err(e)) => {
            let stderr = read_stderr_on_failure(stderr_handle).await;
            let _ = child.kill().await;
            return Err(GatewayError::Connection {
                name: name.to_string(),
                reason: format!("{e}{}", stderr_suffix(&stderr)),
            });
        }
        Err(_) => {
            let stderr = read_stderr_on_failure(stderr_handle).await;
            let _ = child.kill().await;
            return Err(GatewayError::Connection {
                name: name.to_string(),
                reason: format!(
                    "handshake timed out after {}s{}",
                    HANDSHAKE_TIMEOUT.as_secs(),
                    stderr_suffix(&stderr)
                ),
            });
        }
    };

    tracing::info!(
        provider = name,
        tool_count = tools.len(),
        "tool provider connected"
    );

    Ok(ManagedProvider {
        name: name.to_string(),
        process: child,
        transport,
        tools,
    })
}

/// `initialize` then `tools/list` on a fresh transport.
async fn handshake(
    transport: &StdioTransport,
    name: &str,
) -> Result<Vec<ToolDescriptor>, GatewayError> {
    let init_response = transport.request("initialize", None).await?;
    let init_value = extract_result(name, init_response)?;
    let init: InitializeResult =
        serde_json::from_value(init_value).map_err(|e| GatewayError::Connection {
            name: name.to_string(),
            reason: format!("failed to parse initialize response: {e}"),
        })?;

    if let Some(info) = init.server_info {
        tracing::debug!(
            provider = name,
            reported_name = info.name.as_deref().unwrap_or("?"),
            version = info.version.as_deref().unwrap_or("?"),
            "provider identified"
        );
    }

    let list_response = transport.request("tools/list", None).await?;
    let list_value = extract_result(name, list_response)?;
    let list: ToolsListResult =
        serde_json::from_value(list_value).map_err(|e| GatewayError::Connection {
            name: name.to_string(),
            reason: format!("failed to parse tools/list response: {e}"),
        })?;

    Ok(list.tools)
}

/// Read any stderr a failed provider produced, truncated for log hygiene.
async fn read_stderr_on_failure(stderr: Option<tokio::process::ChildStderr>) -> String {
    use tokio::io::AsyncReadExt;

    let Some(mut stderr) = stderr else {
        return String::new();
    };

    let mut buf = String::new();
    match tokio::time::timeout(Duration::from_millis(500), stderr.read_to_string(&mut buf)).await
    {
        Ok(Ok(_)) => {
            if buf.len() > 2000 {
                buf.truncate(2000);
                buf.push_str("...(truncated)");
            }
            buf
        }
        _ => String::new(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" | stderr: {}", stderr.trim())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
