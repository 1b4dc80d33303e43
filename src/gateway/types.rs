//! Shared types for the Tool Gateway.
//!
//! JSON-RPC 2.0 message types and the provider-manifest structures.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// ─── JSON-RPC 2.0 ───────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message (success or error).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

// ─── Provider Protocol Types ────────────────────────────────────────────────

/// A tool as advertised by a provider and exposed in the catalog.
///
/// Catalog names are qualified `provider.tool` so that multiple providers
/// can coexist without collisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Response payload of the `initialize` handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(default)]
    pub capabilities: serde_json::Value,
    #[serde(default, alias = "serverInfo")]
    pub server_info: Option<ProviderInfo>,
}

/// Provider self-identification from the `initialize` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Response payload of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

// ─── Provider Manifest ──────────────────────────────────────────────────────

/// How to launch a single tool provider process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Optional working directory for the provider process.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// The full provider manifest. A `BTreeMap` keeps startup and catalog
/// ordering deterministic across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServersConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl ServersConfig {
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_params_when_none() {
        let req = JsonRpcRequest::new(1, "initialize", None);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"initialize\""));
        assert!(!json.contains("params"));
    }

    #[test]
    fn request_includes_params_when_set() {
        let params = serde_json::json!({"name": "files.list", "arguments": {"path": "/tmp"}});
        let req = JsonRpcRequest::new(7, "tools/call", Some(params));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"id\":7"));
        assert!(json.contains("tools/call"));
        assert!(json.contains("/tmp"));
    }

    #[test]
    fn response_with_error_deserializes() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 2,
            "result": null,
            "error": {"code": -32601, "message": "Method not found"}
        }"#;
        let resp: JsonRpcResponse = serde_json::from_str(json).unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn descriptor_accepts_camel_case_schema_key() {
        let json = r#"{"name": "list", "description": "List notes", "inputSchema": {"type": "object"}}"#;
        let tool: ToolDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(tool.input_schema["type"], "object");
    }

    #[test]
    fn descriptor_defaults_missing_fields() {
        let json = r#"{"name": "list"}"#;
        let tool: ToolDescriptor = serde_json::from_str(json).unwrap();
        assert!(tool.description.is_empty());
        assert!(tool.input_schema.is_null());
    }

    #[test]
    fn manifest_ordering_is_deterministic() {
        let json = r#"{"servers": {
            "zeta": {"command": "zeta-tools"},
            "alpha": {"command": "alpha-tools"}
        }}"#;
        let manifest: ServersConfig = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = manifest.servers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
