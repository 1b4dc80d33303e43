//! Engine configuration loading and validation.
//!
//! Two files make up a deployment:
//! - an engine config (YAML) with provider endpoints and loop limits,
//!   supporting `${VAR}` / `${VAR:-default}` interpolation and `~` expansion
//! - a tool-provider manifest (JSON) listing the commands to spawn

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::agent::RuntimeOptions;
use crate::gateway::ServersConfig;
use crate::provider::ProviderSettings;

/// Configuration loading or validation error.
#[derive(Debug, Error)]
#[error("config error: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

// ─── Engine Config ──────────────────────────────────────────────────────────

/// Loop and gateway bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Bounded retention: keep the `2 × N` most recent messages.
    #[serde(default)]
    pub max_exchanges: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            query_timeout_secs: default_query_timeout_secs(),
            call_timeout_ms: default_call_timeout_ms(),
            max_exchanges: None,
        }
    }
}

fn default_max_tool_rounds() -> usize {
    10
}
fn default_query_timeout_secs() -> u64 {
    120
}
fn default_call_timeout_ms() -> u64 {
    30_000
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl EngineConfig {
    /// Derive the runtime options from the configured limits.
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            max_tool_rounds: self.limits.max_tool_rounds,
            query_timeout: Duration::from_secs(self.limits.query_timeout_secs),
            max_exchanges: self.limits.max_exchanges,
        }
    }
}

/// Load and parse the engine configuration file.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let interpolated = interpolate_env_vars(&raw);

    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError {
        reason: format!("failed to parse {}: {e}", path.display()),
    })
}

/// Load the tool-provider manifest.
pub fn load_servers_config(path: &Path) -> Result<ServersConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let interpolated = interpolate_env_vars(&raw);

    serde_json::from_str(&interpolated).map_err(|e| ConfigError {
        reason: format!("failed to parse {}: {e}", path.display()),
    })
}

// ─── Env-var Interpolation ──────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_uses_default_when_var_unset() {
        std::env::remove_var("__ENGINE_TEST_UNSET__");
        let result = interpolate_env_vars("${__ENGINE_TEST_UNSET__:-/fallback/path}");
        assert_eq!(result, "/fallback/path");
    }

    #[test]
    fn interpolate_prefers_env_value() {
        std::env::set_var("__ENGINE_TEST_SET__", "/custom");
        let result = interpolate_env_vars("${__ENGINE_TEST_SET__:-/fallback}");
        assert_eq!(result, "/custom");
        std::env::remove_var("__ENGINE_TEST_SET__");
    }

    #[test]
    fn interpolate_passes_plain_text_through() {
        let input = "no variables here";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn expand_tilde_resolves_home() {
        let result = expand_tilde("~/notes");
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("/notes"));
    }

    #[test]
    fn engine_config_defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.limits.max_tool_rounds, 10);
        assert_eq!(config.limits.query_timeout_secs, 120);
        assert_eq!(config.limits.call_timeout_ms, 30_000);
        assert!(config.limits.max_exchanges.is_none());
    }

    #[test]
    fn engine_config_parses_from_yaml() {
        let yaml = r#"
            providers:
              local:
                base_url: "http://localhost:11434/v1"
                model: "qwen2.5:7b"
              remote:
                base_url: "https://api.example.com/v1"
                model: "bigmodel-latest"
                max_tokens: 4096
            limits:
              max_tool_rounds: 6
              max_exchanges: 10
        "#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.providers.remote.model, "bigmodel-latest");
        assert_eq!(config.providers.remote.max_tokens, 4096);
        assert_eq!(config.limits.max_tool_rounds, 6);
        assert_eq!(config.limits.max_exchanges, Some(10));

        let options = config.runtime_options();
        assert_eq!(options.max_tool_rounds, 6);
        assert_eq!(options.query_timeout, Duration::from_secs(120));
        assert_eq!(options.max_exchanges, Some(10));
    }

    #[test]
    fn servers_config_parses_with_interpolation() {
        std::env::set_var("__ENGINE_TEST_TOKEN__", "sekrit");
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tool_servers.json");
        std::fs::write(
            &path,
            r#"{
                "servers": {
                    "notes": {
                        "command": "notes-mcp",
                        "args": ["--stdio"],
                        "env": {"NOTES_API_KEY": "${__ENGINE_TEST_TOKEN__}"}
                    }
                }
            }"#,
        )
        .unwrap();

        let manifest = load_servers_config(&path).unwrap();
        let notes = manifest.servers.get("notes").unwrap();
        assert_eq!(notes.command, "notes-mcp");
        assert_eq!(notes.env.get("NOTES_API_KEY").unwrap(), "sekrit");
        std::env::remove_var("__ENGINE_TEST_TOKEN__");
    }

    #[test]
    fn missing_files_fail_with_context() {
        let err = load_engine_config(Path::new("/nonexistent/engine.yaml")).unwrap_err();
        assert!(err.reason.contains("/nonexistent/engine.yaml"));

        let err = load_servers_config(Path::new("/nonexistent/servers.json")).unwrap_err();
        assert!(err.reason.contains("failed to read"));
    }
}
