//! Persistence adapter — converts conversation state to and from a plain
//! serializable snapshot for external storage.
//!
//! The host owns the storage boundary (`load`/`save` of an opaque blob);
//! this module owns the snapshot shape and its round-trip law: restoring a
//! snapshot reproduces the message sequence and thread ID exactly. File
//! helpers are provided for hosts that persist to disk directly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::{ConversationStore, Message, Role};
use super::errors::AgentError;

// ─── Snapshot Shape ─────────────────────────────────────────────────────────

/// One persisted message: `type` is `human`, `assistant`, or `tool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
}

/// Serializable form of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    /// Absent in snapshots produced by older hosts; restore mints a fresh ID.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Envelope timestamp for hosts, not part of the round-trip law.
    #[serde(default)]
    pub saved_at: Option<String>,
    pub messages: Vec<SnapshotMessage>,
}

// ─── Conversion ─────────────────────────────────────────────────────────────

/// Snapshot the current conversation state.
pub fn to_snapshot(store: &ConversationStore) -> ConversationSnapshot {
    ConversationSnapshot {
        thread_id: Some(store.thread_id().to_string()),
        saved_at: Some(chrono::Utc::now().to_rfc3339()),
        messages: store
            .messages()
            .iter()
            .map(|m| SnapshotMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect(),
    }
}

/// Rebuild a conversation store from a snapshot.
///
/// A missing `thread_id` gets a freshly minted one rather than staying
/// undefined.
pub fn from_snapshot(
    snapshot: ConversationSnapshot,
    max_exchanges: Option<usize>,
) -> ConversationStore {
    let thread_id = snapshot
        .thread_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let messages = snapshot
        .messages
        .into_iter()
        .map(|m| Message {
            role: m.role,
            content: m.content,
        })
        .collect();

    ConversationStore::from_parts(thread_id, messages, max_exchanges)
}

/// Parse an opaque host blob into a snapshot. Fails closed on unknown
/// message types or a malformed shape.
pub fn snapshot_from_value(blob: serde_json::Value) -> Result<ConversationSnapshot, AgentError> {
    serde_json::from_value(blob).map_err(|e| AgentError::Serialization {
        reason: format!("malformed snapshot: {e}"),
    })
}

/// Render a snapshot as an opaque host blob.
pub fn snapshot_to_value(snapshot: &ConversationSnapshot) -> Result<serde_json::Value, AgentError> {
    serde_json::to_value(snapshot).map_err(AgentError::from)
}

// ─── File Helpers ───────────────────────────────────────────────────────────

/// Save a snapshot to disk (atomic write via tmp + rename).
pub fn save_snapshot(path: &Path, snapshot: &ConversationSnapshot) -> Result<(), AgentError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AgentError::Serialization {
            reason: format!("failed to create {}: {e}", parent.display()),
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(&tmp_path, &content).map_err(|e| AgentError::Serialization {
        reason: format!("failed to write {}: {e}", tmp_path.display()),
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| AgentError::Serialization {
        reason: format!("failed to rename into {}: {e}", path.display()),
    })?;

    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Load a snapshot from disk, if one exists.
pub fn load_snapshot(path: &Path) -> Result<Option<ConversationSnapshot>, AgentError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| AgentError::Serialization {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    let snapshot: ConversationSnapshot =
        serde_json::from_str(&content).map_err(|e| AgentError::Serialization {
            reason: format!("malformed snapshot in {}: {e}", path.display()),
        })?;
    Ok(Some(snapshot))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
