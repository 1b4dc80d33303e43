//! OpenAI-compatible model client.
//!
//! One concrete client serves both the local runtime (Ollama-style, no
//! credential) and remote endpoints (bearer token). The agent runtime only
//! sees the `ModelClient` capability interface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use uuid::Uuid;

use crate::agent::conversation::{Message, Role};
use crate::gateway::ToolDescriptor;

use super::errors::ProviderError;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ModelOutput, ToolCallRequest, ToolDefinition,
    WireMessage,
};

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Capability Interface ───────────────────────────────────────────────────

/// The model capability the agent runtime binds against.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the transcript and tool catalog, get back either a final answer
    /// or a batch of tool-call requests.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelOutput, ProviderError>;
}

// ─── Endpoint Settings ──────────────────────────────────────────────────────

/// Connection settings for one chat-completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSettings {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_request_timeout_secs() -> u64 {
    120
}

// ─── HttpModelClient ────────────────────────────────────────────────────────

/// Chat-completion client for an OpenAI-compatible endpoint.
pub struct HttpModelClient {
    http: HttpClient,
    settings: EndpointSettings,
    api_key: Option<String>,
}

impl HttpModelClient {
    pub fn new(
        settings: EndpointSettings,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionFailed {
                endpoint: settings.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    /// The model name this client targets.
    pub fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelOutput, ProviderError> {
        let url = format!("{}/chat/completions", self.settings.base_url);

        let wire_tools: Option<Vec<ToolDefinition>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(ToolDefinition::from_descriptor).collect())
        };

        let body = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: messages.iter().map(to_wire_message).collect(),
            tool_choice: wire_tools.as_ref().map(|_| "auto".to_string()),
            tools: wire_tools,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        };

        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "model request"
        );

        let mut request = self.http.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    duration_secs: self.settings.request_timeout_secs,
                }
            } else {
                ProviderError::ConnectionFailed {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| ProviderError::MalformedResponse {
                reason: format!("failed to read response body: {e}"),
            })?;

        parse_completion(&body_text)
    }
}

// ─── Wire Conversion ────────────────────────────────────────────────────────

/// Map a transcript message to the wire form.
///
/// Tool observations already carry the tool name in their content, so they
/// travel as `user` turns — the textual-observation pattern keeps the engine
/// independent of each backend's tool-message envelope.
fn to_wire_message(message: &Message) -> WireMessage {
    let role = match message.role {
        Role::Human => "user",
        Role::Assistant => "assistant",
        Role::Tool => "user",
    };
    WireMessage {
        role: role.to_string(),
        content: message.content.clone(),
    }
}

/// Parse a non-streaming completion body into a `ModelOutput`.
pub fn parse_completion(body: &str) -> Result<ModelOutput, ProviderError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
            reason: format!("failed to parse completion: {e}"),
        })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse {
            reason: "completion contained no choices".into(),
        })?;

    if let Some(calls) = choice.message.tool_calls {
        if !calls.is_empty() {
            let requests = calls
                .into_iter()
                .map(|call| {
                    let input = parse_arguments(&call.function.arguments);
                    ToolCallRequest {
                        id: call
                            .id
                            .unwrap_or_else(|| format!("call_{}", Uuid::new_v4())),
                        name: call.function.name,
                        input,
                    }
                })
                .collect();
            return Ok(ModelOutput::ToolCalls(requests));
        }
    }

    Ok(ModelOutput::FinalAnswer(
        choice.message.content.unwrap_or_default(),
    ))
}

/// OpenAI encodes arguments as a JSON string; some local runtimes send the
/// object directly. Anything unparseable becomes an empty object so a single
/// malformed call degrades into a provider-side validation error instead of
/// killing the query.
fn parse_arguments(raw: &serde_json::Value) -> serde_json::Value {
    match raw {
        serde_json::Value::String(s) => {
            serde_json::from_str(s).unwrap_or_else(|_| serde_json::json!({}))
        }
        serde_json::Value::Null => serde_json::json!({}),
        other => other.clone(),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_mapping_covers_all_roles() {
        let human = Message::human("hi");
        let assistant = Message::assistant("hello");
        let tool = Message::tool_observation("notes.list_files", &serde_json::json!(["a.md"]));

        assert_eq!(to_wire_message(&human).role, "user");
        assert_eq!(to_wire_message(&assistant).role, "assistant");
        let wired_tool = to_wire_message(&tool);
        assert_eq!(wired_tool.role, "user");
        assert!(wired_tool.content.contains("notes.list_files"));
    }

    #[test]
    fn parse_completion_final_answer() {
        let body = r#"{
            "choices": [{
                "message": {"content": "You have 2 files."},
                "finish_reason": "stop"
            }]
        }"#;
        let output = parse_completion(body).unwrap();
        assert_eq!(output, ModelOutput::FinalAnswer("You have 2 files.".into()));
    }

    #[test]
    fn parse_completion_tool_calls() {
        let body = r#"{
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
        match parse_completion(body).unwrap() {
            ModelOutput::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "notes.list_files");
                assert_eq!(calls[0].input["path"], "/");
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }

    #[test]
    fn parse_completion_object_arguments() {
        // Ollama-style: arguments as an object, no call id.
        let body = r#"{
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {"name": "notes.read_file", "arguments": {"path": "a.md"}}
                    }]
                }
            }]
        }"#;
        match parse_completion(body).unwrap() {
            ModelOutput::ToolCalls(calls) => {
                assert_eq!(calls[0].input["path"], "a.md");
                assert!(calls[0].id.starts_with("call_"));
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }

    #[test]
    fn parse_completion_empty_tool_calls_is_final_answer() {
        let body = r#"{
            "choices": [{
                "message": {"content": "done", "tool_calls": []}
            }]
        }"#;
        assert_eq!(
            parse_completion(body).unwrap(),
            ModelOutput::FinalAnswer("done".into())
        );
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_completion_rejects_empty_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn malformed_argument_string_degrades_to_empty_object() {
        let raw = serde_json::Value::String("{not valid".into());
        assert_eq!(parse_arguments(&raw), serde_json::json!({}));
    }
}
