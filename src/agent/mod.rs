//! Agent core — conversation state, persistence, events, and the runtime
//! that drives the reasoning/tool loop.

pub mod conversation;
pub mod errors;
pub mod events;
pub mod persistence;
pub mod runtime;

pub use conversation::{ConversationStore, Message, Role};
pub use errors::AgentError;
pub use events::{AgentEvent, EventSink, NullSink};
pub use persistence::{ConversationSnapshot, SnapshotMessage};
pub use runtime::{AgentRuntime, RuntimeOptions};
