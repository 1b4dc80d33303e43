//! Tool Gateway — high-level interface for tool discovery and execution.
//!
//! `connect` turns a provider manifest into a live catalog plus a cleanup
//! handle; `invoke` routes a call to the owning provider. Startup is
//! all-or-nothing: a manifest with one unreachable provider yields an error,
//! never a partial catalog.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;

use super::errors::GatewayError;
use super::lifecycle::{spawn_provider, ManagedProvider};
use super::registry::ToolRegistry;
use super::transport::extract_result;
use super::types::{ServersConfig, ToolDescriptor};

/// Default timeout for a single tool call (ms).
const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

// ─── Capability Interface ───────────────────────────────────────────────────

/// The tool capability the agent runtime binds against.
///
/// `ToolGateway` is the production implementation; tests substitute scripted
/// invokers.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// The invocable catalog.
    fn catalog(&self) -> &[ToolDescriptor];

    /// Invoke one tool. Per-call failures come back as recoverable errors.
    async fn invoke(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;

    /// Terminate underlying provider resources. Must be idempotent.
    async fn cleanup(&mut self);
}

// ─── ToolGateway ────────────────────────────────────────────────────────────

/// Live binding to all configured tool providers.
#[derive(Debug)]
pub struct ToolGateway {
    providers: HashMap<String, ManagedProvider>,
    registry: ToolRegistry,
    call_timeout_ms: u64,
}

impl ToolGateway {
    /// Connect every provider in the manifest and aggregate the catalog.
    ///
    /// If any provider fails to start or complete its handshake, providers
    /// that already started are shut down and the first error is returned.
    pub async fn connect(config: &ServersConfig) -> Result<Self, GatewayError> {
        let spawns = config
            .servers
            .iter()
            .map(|(name, server)| async move {
                (name.clone(), spawn_provider(name, server).await)
            });

        let mut providers: HashMap<String, ManagedProvider> = HashMap::new();
        let mut first_error: Option<GatewayError> = None;

        for (name, outcome) in join_all(spawns).await {
            match outcome {
                Ok(provider) => {
                    providers.insert(name, provider);
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "provider failed to start");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            tracing::error!(error = %err, "tool gateway startup failed — shutting down partial set");
            for (_, mut provider) in providers.drain() {
                provider.shutdown().await;
            }
            return Err(err);
        }

        let mut registry = ToolRegistry::new();
        // Manifest order, not HashMap order, keeps the catalog deterministic.
        for name in config.servers.keys() {
            if let Some(provider) = providers.get(name) {
                registry.register_provider_tools(name, provider.tools.clone());
            }
        }

        tracing::info!(
            provider_count = providers.len(),
            tool_count = registry.len(),
            "tool gateway connected"
        );

        Ok(Self {
            providers,
            registry,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        })
    }

    /// Override the per-call timeout.
    pub fn set_call_timeout(&mut self, timeout_ms: u64) {
        self.call_timeout_ms = timeout_ms;
    }

    /// Number of connected providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Number of catalog tools.
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

#[async_trait]
impl ToolInvoker for ToolGateway {
    fn catalog(&self) -> &[ToolDescriptor] {
        self.registry.catalog()
    }

    async fn invoke(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let start = Instant::now();

        self.registry.validate_call(name, &input)?;

        let provider_name = self
            .registry
            .owner_of(name)
            .ok_or_else(|| GatewayError::UnknownTool {
                name: name.to_string(),
            })?
            .to_string();

        let provider =
            self.providers
                .get(&provider_name)
                .ok_or_else(|| GatewayError::Transport {
                    provider: provider_name.clone(),
                    reason: "provider not running".into(),
                })?;

        // Providers see their own unqualified tool names.
        let local_name = name
            .strip_prefix(&format!("{provider_name}."))
            .unwrap_or(name);

        let params = serde_json::json!({
            "name": local_name,
            "arguments": input,
        });

        let response = tokio::time::timeout(
            std::time::Duration::from_millis(self.call_timeout_ms),
            provider.transport.request("tools/call", Some(params)),
        )
        .await
        .map_err(|_| GatewayError::Timeout {
            tool: name.to_string(),
            timeout_ms: self.call_timeout_ms,
        })??;

        let result = extract_result(&provider_name, response).map_err(|e| match e {
            // Provider-reported failures carry the tool name, not the provider's.
            GatewayError::ToolExecution { reason, .. } => GatewayError::ToolExecution {
                tool: name.to_string(),
                reason,
            },
            other => other,
        })?;

        tracing::debug!(
            tool = name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tool call completed"
        );

        Ok(result)
    }

    async fn cleanup(&mut self) {
        if self.providers.is_empty() {
            return;
        }
        for (name, mut provider) in self.providers.drain() {
            tracing::debug!(provider = %name, "shutting down tool provider");
            provider.shutdown().await;
        }
        self.registry = ToolRegistry::new();
        tracing::info!("tool gateway cleaned up");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
