//! Wire types for OpenAI-compatible chat-completion endpoints, plus the
//! provider-neutral model output consumed by the agent runtime.

use serde::{Deserialize, Serialize};

use crate::gateway::ToolDescriptor;

// ─── Model Output ───────────────────────────────────────────────────────────

/// What the model produced for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A final natural-language answer — the loop terminates.
    FinalAnswer(String),
    /// One or more tool-call requests — the loop dispatches and continues.
    ToolCalls(Vec<ToolCallRequest>),
}

/// A single tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Call ID (generated when the backend does not provide one).
    pub id: String,
    /// Qualified catalog name, e.g. `notes.list_files`.
    pub name: String,
    /// Parsed JSON arguments.
    pub input: serde_json::Value,
}

// ─── Request Types ──────────────────────────────────────────────────────────

/// A transcript message in OpenAI wire form.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Tool definition sent in the request.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

/// Function definition within a tool.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Convert a catalog descriptor into the wire form.
    pub fn from_descriptor(descriptor: &ToolDescriptor) -> Self {
        let parameters = if descriptor.input_schema.is_null() {
            serde_json::json!({"type": "object", "properties": {}})
        } else {
            descriptor.input_schema.clone()
        };
        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters,
            },
        }
    }
}

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

// ─── Response Types ─────────────────────────────────────────────────────────

/// Non-streaming chat-completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Tool call in the OpenAI response format.
#[derive(Debug, Clone, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// OpenAI sends a JSON-encoded string; some local runtimes send the
    /// object directly. Both are accepted.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition_from_descriptor() {
        let descriptor = ToolDescriptor {
            name: "notes.list_files".into(),
            description: "List files in the vault".into(),
            input_schema: serde_json::json!({"type": "object", "required": ["path"]}),
        };
        let def = ToolDefinition::from_descriptor(&descriptor);
        assert_eq!(def.r#type, "function");
        assert_eq!(def.function.name, "notes.list_files");
        assert_eq!(def.function.parameters["required"][0], "path");
    }

    #[test]
    fn tool_definition_fills_empty_schema() {
        let descriptor = ToolDescriptor {
            name: "notes.ping".into(),
            description: String::new(),
            input_schema: serde_json::Value::Null,
        };
        let def = ToolDefinition::from_descriptor(&descriptor);
        assert_eq!(def.function.parameters["type"], "object");
    }

    #[test]
    fn request_omits_tools_when_none() {
        let req = ChatCompletionRequest {
            model: "test".into(),
            messages: vec![],
            tools: None,
            tool_choice: None,
            temperature: 0.0,
            max_tokens: 512,
            stream: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("tools"));
        assert!(!json.contains("tool_choice"));
    }

    #[test]
    fn response_parses_tool_calls_with_string_arguments() {
        let json = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "notes.list_files", "arguments": "{\"path\": \"/\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        let calls = resp.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "notes.list_files");
        assert!(calls[0].function.arguments.is_string());
    }
}
