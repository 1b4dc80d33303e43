//! Provider selection — resolves a named provider plus credentials into a
//! live model client.
//!
//! `local` needs no credential and is always constructible. `remote` needs a
//! non-empty credential; without one the selector falls back to `local` and
//! says so — the caller always learns which provider is actually active.

use serde::{Deserialize, Serialize};

use super::client::{EndpointSettings, HttpModelClient, ModelClient};
use super::errors::ProviderError;

// ─── ProviderKind ───────────────────────────────────────────────────────────

/// Which model backend to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// On-device OpenAI-compatible runtime (Ollama-style endpoint).
    Local,
    /// Hosted OpenAI-compatible endpoint, authenticated by bearer token.
    Remote,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::Remote => write!(f, "remote"),
        }
    }
}

// ─── Settings ───────────────────────────────────────────────────────────────

/// Endpoint settings for both providers.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_local_endpoint")]
    pub local: EndpointSettings,
    #[serde(default = "default_remote_endpoint")]
    pub remote: EndpointSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            local: default_local_endpoint(),
            remote: default_remote_endpoint(),
        }
    }
}

fn default_local_endpoint() -> EndpointSettings {
    EndpointSettings {
        base_url: "http://localhost:11434/v1".to_string(),
        model: "qwen2.5:7b".to_string(),
        temperature: 0.0,
        max_tokens: 2048,
        request_timeout_secs: 120,
    }
}

fn default_remote_endpoint() -> EndpointSettings {
    EndpointSettings {
        base_url: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.0,
        max_tokens: 2048,
        request_timeout_secs: 120,
    }
}

// ─── Resolution ─────────────────────────────────────────────────────────────

/// Result of resolving a provider request.
pub struct ProviderSelection {
    /// The provider actually bound — may differ from the request.
    pub kind: ProviderKind,
    pub client: Box<dyn ModelClient>,
    /// True when `remote` was requested without a usable credential.
    pub fell_back: bool,
}

/// Resolve `(kind, credential)` into a configured model client.
pub fn resolve(
    requested: ProviderKind,
    credential: Option<&str>,
    settings: &ProviderSettings,
) -> Result<ProviderSelection, ProviderError> {
    match requested {
        ProviderKind::Local => {
            let client = HttpModelClient::new(settings.local.clone(), None)?;
            Ok(ProviderSelection {
                kind: ProviderKind::Local,
                client: Box::new(client),
                fell_back: false,
            })
        }
        ProviderKind::Remote => match credential.filter(|c| !c.trim().is_empty()) {
            Some(key) => {
                let client =
                    HttpModelClient::new(settings.remote.clone(), Some(key.to_string()))?;
                Ok(ProviderSelection {
                    kind: ProviderKind::Remote,
                    client: Box::new(client),
                    fell_back: false,
                })
            }
            None => {
                tracing::warn!(
                    "remote provider requested without a credential — falling back to local"
                );
                let client = HttpModelClient::new(settings.local.clone(), None)?;
                Ok(ProviderSelection {
                    kind: ProviderKind::Local,
                    client: Box::new(client),
                    fell_back: true,
                })
            }
        },
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
