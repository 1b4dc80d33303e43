//! Conversation store — the ordered transcript for one conversation thread.
//!
//! Responsibilities:
//! - Own the append-only message sequence and the thread identity
//! - Enforce the bounded-retention policy (oldest-first eviction)
//! - Mint a fresh thread ID on explicit clear

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Message ────────────────────────────────────────────────────────────────

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
    /// A tool observation recorded between model turns.
    Tool,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// A successful tool outcome, recorded as a structured observation.
    pub fn tool_observation(tool: &str, output: &serde_json::Value) -> Self {
        Self {
            role: Role::Tool,
            content: serde_json::json!({"tool": tool, "output": output}).to_string(),
        }
    }

    /// A failed tool outcome. The failure is part of the transcript so the
    /// model can react to it on the next turn.
    pub fn tool_failure(tool: &str, reason: &str) -> Self {
        Self {
            role: Role::Tool,
            content: serde_json::json!({"tool": tool, "error": reason}).to_string(),
        }
    }
}

// ─── ConversationStore ──────────────────────────────────────────────────────

/// Ordered transcript plus thread identity and retention policy.
///
/// `max_exchanges = N` bounds retention to the `2 × N` most recent messages
/// (one exchange ≈ one human turn + one assistant turn). Trimming only ever
/// discards from the front.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    thread_id: String,
    messages: Vec<Message>,
    max_exchanges: Option<usize>,
}

impl ConversationStore {
    /// Fresh empty store with a newly minted thread ID.
    pub fn new(max_exchanges: Option<usize>) -> Self {
        Self {
            thread_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            max_exchanges,
        }
    }

    /// Rebuild a store from persisted parts. Used by the persistence adapter.
    pub(crate) fn from_parts(
        thread_id: String,
        messages: Vec<Message>,
        max_exchanges: Option<usize>,
    ) -> Self {
        let mut store = Self {
            thread_id,
            messages,
            max_exchanges,
        };
        store.trim();
        store
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Pin the thread identity, e.g. when resuming a persisted conversation.
    pub(crate) fn set_thread_id(&mut self, thread_id: String) {
        self.thread_id = thread_id;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message and apply the retention policy.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.trim();
    }

    /// Reconfigure retention and re-trim immediately.
    pub fn set_max_exchanges(&mut self, max_exchanges: Option<usize>) {
        self.max_exchanges = max_exchanges;
        self.trim();
    }

    /// Drop oldest messages until at most `2 × max_exchanges` remain.
    pub fn trim(&mut self) {
        let Some(max) = self.max_exchanges else {
            return;
        };
        let cap = max.saturating_mul(2);
        if self.messages.len() > cap {
            let excess = self.messages.len() - cap;
            self.messages.drain(..excess);
            tracing::debug!(
                thread_id = %self.thread_id,
                evicted = excess,
                retained = self.messages.len(),
                "trimmed conversation history"
            );
        }
    }

    /// Empty the transcript and mint a new thread ID.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.thread_id = Uuid::new_v4().to_string();
        tracing::info!(thread_id = %self.thread_id, "conversation cleared");
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
