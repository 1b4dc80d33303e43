//! Typed instrumentation events.
//!
//! The runtime reports model and tool lifecycle edges to an injected
//! observer. Events are informational only — a sink can render, log, or
//! drop them, but nothing it does affects the loop.

use serde::Serialize;

/// One lifecycle event from the reasoning/tool loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A model call is about to start.
    ModelStart,
    /// A model call finished; carries the raw output summary.
    ModelEnd { output: serde_json::Value },
    /// A tool call is about to be dispatched.
    ToolStart {
        name: String,
        input: serde_json::Value,
    },
    /// A tool call succeeded.
    ToolEnd { output: serde_json::Value },
}

/// Observer interface consumed by host shells.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: AgentEvent);
}

/// Default sink that discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: AgentEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = AgentEvent::ToolStart {
            name: "notes.list_files".into(),
            input: serde_json::json!({"path": "/"}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "tool_start");
        assert_eq!(json["name"], "notes.list_files");
    }

    #[test]
    fn null_sink_accepts_events() {
        NullSink.on_event(AgentEvent::ModelStart);
    }
}
