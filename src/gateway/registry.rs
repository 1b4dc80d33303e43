//! Tool registry — the aggregated catalog across all providers.
//!
//! Catalog names are qualified `provider.tool` (e.g. `notes.list_files`) so
//! that providers can expose overlapping tool names without collisions.

use std::collections::HashMap;

use super::errors::GatewayError;
use super::types::ToolDescriptor;

/// Aggregated tool catalog with owner lookup and argument validation.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// `qualified_name → (provider_name, descriptor)`.
    tools: HashMap<String, (String, ToolDescriptor)>,
    /// Catalog in deterministic registration order.
    catalog: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider's tools under qualified names.
    ///
    /// Names already containing a `.` are taken as pre-qualified.
    pub fn register_provider_tools(&mut self, provider: &str, tools: Vec<ToolDescriptor>) {
        for mut tool in tools {
            if !tool.name.contains('.') {
                tool.name = format!("{provider}.{}", tool.name);
            }
            self.tools
                .insert(tool.name.clone(), (provider.to_string(), tool.clone()));
            self.catalog.push(tool);
        }
    }

    /// Look up a tool by qualified name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|(_, def)| def)
    }

    /// The provider that owns a tool.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|(provider, _)| provider.as_str())
    }

    /// The full catalog in registration order.
    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check a call against the registered schema before dispatch.
    ///
    /// Validation is shallow: the tool must exist and every `required` field
    /// of its input schema must be present. Deep type checking is the
    /// provider's job.
    pub fn validate_call(
        &self,
        name: &str,
        arguments: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let def = self.get(name).ok_or_else(|| GatewayError::UnknownTool {
            name: name.to_string(),
        })?;

        if let Some(required) = def.input_schema.get("required").and_then(|r| r.as_array()) {
            let args = arguments.as_object();
            for field in required.iter().filter_map(|f| f.as_str()) {
                let present = args.map(|obj| obj.contains_key(field)).unwrap_or(false);
                if !present {
                    return Err(GatewayError::InvalidArguments {
                        tool: name.to_string(),
                        reason: format!("missing required field: '{field}'"),
                    });
                }
            }
        }

        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
