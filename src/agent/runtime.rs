//! Agent runtime — drives the reasoning/tool loop.
//!
//! One runtime owns one conversation thread and at most one live
//! model+tool binding. `process_query` sends the transcript and tool
//! catalog to the model, dispatches requested tool calls through the
//! gateway, feeds observations back, and repeats until the model produces
//! a final answer or a bound is hit.
//!
//! Concurrency contract: every mutating operation acquires the runtime
//! state with `try_lock`. A second operation while a query is in flight is
//! rejected with `AgentError::Busy` — never queued behind it.

use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex as TokioMutex};

use crate::gateway::{ServersConfig, ToolGateway, ToolInvoker};
use crate::provider::{
    self, ModelClient, ModelOutput, ProviderKind, ProviderSettings, ToolCallRequest,
};

use super::conversation::{ConversationStore, Message};
use super::errors::AgentError;
use super::events::{AgentEvent, EventSink, NullSink};
use super::persistence::{self, ConversationSnapshot};

// ─── Options ────────────────────────────────────────────────────────────────

/// Tunable bounds for the reasoning loop.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Maximum tool-call rounds per query before the loop is aborted.
    pub max_tool_rounds: usize,
    /// Per-query deadline, enforced at every model/tool suspension point.
    pub query_timeout: Duration,
    /// Retention bound for the conversation store (exchanges, not messages).
    pub max_exchanges: Option<usize>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            query_timeout: Duration::from_secs(120),
            max_exchanges: None,
        }
    }
}

// ─── RuntimeHandle ──────────────────────────────────────────────────────────

/// The live model+tool binding. Exactly one per runtime; replacing it first
/// retires the previous gateway.
struct RuntimeHandle {
    kind: ProviderKind,
    model: Box<dyn ModelClient>,
    tools: Box<dyn ToolInvoker>,
}

struct RuntimeState {
    conversation: ConversationStore,
    handle: Option<RuntimeHandle>,
    /// Provider manifest retained for re-initialization on provider switches.
    servers: Option<ServersConfig>,
}

// ─── AgentRuntime ───────────────────────────────────────────────────────────

/// The conversation and tool-orchestration engine.
pub struct AgentRuntime {
    state: TokioMutex<RuntimeState>,
    settings: ProviderSettings,
    options: RuntimeOptions,
    events: Box<dyn EventSink>,
    /// Mirror of the bound provider kind, readable while a query runs.
    active_kind: std::sync::RwLock<Option<ProviderKind>>,
    cancel_tx: watch::Sender<bool>,
}

impl AgentRuntime {
    pub fn new(settings: ProviderSettings, options: RuntimeOptions) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            state: TokioMutex::new(RuntimeState {
                conversation: ConversationStore::new(options.max_exchanges),
                handle: None,
                servers: None,
            }),
            settings,
            options,
            events: Box::new(NullSink),
            active_kind: std::sync::RwLock::new(None),
            cancel_tx,
        }
    }

    /// Install an instrumentation sink. Events are informational only.
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    fn emit(&self, event: AgentEvent) {
        self.events.on_event(event);
    }

    fn set_active_kind(&self, kind: Option<ProviderKind>) {
        if let Ok(mut slot) = self.active_kind.write() {
            *slot = kind;
        }
    }

    /// The provider actually bound right now (readable mid-query).
    pub fn current_provider(&self) -> Option<ProviderKind> {
        self.active_kind.read().ok().and_then(|slot| *slot)
    }

    // ─── Initialization & Provider Switching ────────────────────────────

    /// Resolve the model client, connect the tool gateway, and bind both.
    ///
    /// Any failure leaves the runtime uninitialized — no partial handle is
    /// retained. A `thread_id` pins the conversation identity when resuming
    /// a persisted thread.
    pub async fn initialize(
        &self,
        kind: ProviderKind,
        credential: Option<&str>,
        servers: ServersConfig,
        thread_id: Option<String>,
    ) -> Result<ProviderKind, AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;

        // Retire any previous binding before establishing the next one so
        // provider processes never leak across re-initialization.
        if let Some(mut old) = state.handle.take() {
            self.set_active_kind(None);
            old.tools.cleanup().await;
        }

        let bound = Self::bind(&self.settings, kind, credential, &servers).await?;
        let actual = bound.kind;

        if let Some(id) = thread_id {
            state.conversation.set_thread_id(id);
        }
        state.servers = Some(servers);
        state.handle = Some(bound);
        self.set_active_kind(Some(actual));

        tracing::info!(
            provider = %actual,
            thread_id = %state.conversation.thread_id(),
            "agent runtime initialized"
        );
        Ok(actual)
    }

    /// Switch the active provider, preserving the conversation thread.
    ///
    /// A no-op when the requested kind equals the active one. Otherwise the
    /// previous gateway is retired and the binding rebuilt from the retained
    /// manifest; failure leaves the runtime uninitialized.
    pub async fn switch_provider(
        &self,
        kind: ProviderKind,
        credential: Option<&str>,
    ) -> Result<ProviderKind, AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;

        let active = state.handle.as_ref().map(|h| h.kind);
        if active == Some(kind) {
            tracing::debug!(provider = %kind, "switch_provider is a no-op");
            return Ok(kind);
        }

        let servers = state
            .servers
            .clone()
            .ok_or(AgentError::NotInitialized)?;

        if let Some(mut old) = state.handle.take() {
            self.set_active_kind(None);
            old.tools.cleanup().await;
        }

        let bound = Self::bind(&self.settings, kind, credential, &servers).await?;
        let actual = bound.kind;
        state.handle = Some(bound);
        self.set_active_kind(Some(actual));

        tracing::info!(provider = %actual, "provider switched");
        Ok(actual)
    }

    async fn bind(
        settings: &ProviderSettings,
        kind: ProviderKind,
        credential: Option<&str>,
        servers: &ServersConfig,
    ) -> Result<RuntimeHandle, AgentError> {
        let selection = provider::resolve(kind, credential, settings).map_err(|e| {
            AgentError::Initialization {
                reason: e.to_string(),
            }
        })?;
        if selection.fell_back {
            tracing::warn!(requested = %kind, actual = %selection.kind, "provider fallback applied");
        }

        let gateway = ToolGateway::connect(servers).await?;

        Ok(RuntimeHandle {
            kind: selection.kind,
            model: selection.client,
            tools: Box::new(gateway),
        })
    }

    // ─── Query Processing ───────────────────────────────────────────────

    /// Run one user query through the reasoning/tool loop.
    pub async fn process_query(&self, text: &str) -> Result<String, AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        if state.handle.is_none() {
            return Err(AgentError::NotInitialized);
        }

        // Arm a fresh cancellation window for this query.
        self.cancel_tx.send_replace(false);
        let deadline = Instant::now() + self.options.query_timeout;

        state.conversation.append(Message::human(text));

        match self.run_loop(&mut state, deadline).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                // A failed loop would otherwise leave the transcript ending
                // on an orphaned human turn; record the failure as a marker
                // assistant message so persisted history stays consistent.
                state
                    .conversation
                    .append(Message::assistant(format!(
                        "The request could not be completed: {e}"
                    )));
                tracing::warn!(error = %e, "query failed");
                Err(e)
            }
        }
    }

    async fn run_loop(
        &self,
        state: &mut RuntimeState,
        deadline: Instant,
    ) -> Result<String, AgentError> {
        let max_rounds = self.options.max_tool_rounds;

        for round in 0..max_rounds {
            let RuntimeState {
                conversation,
                handle,
                ..
            } = &mut *state;
            let handle = handle.as_ref().ok_or(AgentError::NotInitialized)?;

            tracing::info!(
                thread_id = %conversation.thread_id(),
                round,
                message_count = conversation.len(),
                "agent loop round"
            );

            self.emit(AgentEvent::ModelStart);
            let output = self
                .await_point(
                    deadline,
                    handle
                        .model
                        .generate(conversation.messages(), handle.tools.catalog()),
                )
                .await??;
            self.emit(AgentEvent::ModelEnd {
                output: model_output_to_value(&output),
            });

            match output {
                ModelOutput::FinalAnswer(content) => {
                    conversation.append(Message::assistant(content.clone()));
                    tracing::info!(round, "query complete");
                    return Ok(content);
                }
                ModelOutput::ToolCalls(calls) => {
                    // Dispatch in request order so observations land in the
                    // transcript deterministically.
                    for call in &calls {
                        self.dispatch_tool_call(conversation, handle, call, deadline)
                            .await?;
                    }
                }
            }
        }

        Err(AgentError::LoopLimitExceeded { max_rounds })
    }

    async fn dispatch_tool_call(
        &self,
        conversation: &mut ConversationStore,
        handle: &RuntimeHandle,
        call: &ToolCallRequest,
        deadline: Instant,
    ) -> Result<(), AgentError> {
        self.emit(AgentEvent::ToolStart {
            name: call.name.clone(),
            input: call.input.clone(),
        });
        tracing::info!(tool = %call.name, "dispatching tool call");

        let outcome = self
            .await_point(deadline, handle.tools.invoke(&call.name, call.input.clone()))
            .await?;

        match outcome {
            Ok(output) => {
                self.emit(AgentEvent::ToolEnd {
                    output: output.clone(),
                });
                conversation.append(Message::tool_observation(&call.name, &output));
            }
            Err(e) if e.is_recoverable() => {
                // The failure becomes an observation; the model decides how
                // to proceed on the next round.
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                conversation.append(Message::tool_failure(&call.name, &e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Await a model or tool future, honoring the query deadline and the
    /// cancellation token. These are the loop's only suspension points.
    async fn await_point<T>(
        &self,
        deadline: Instant,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, AgentError> {
        let timeout_secs = self.options.query_timeout.as_secs();
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .ok_or(AgentError::QueryTimeout { timeout_secs })?;

        let mut cancel_rx = self.cancel_tx.subscribe();

        tokio::select! {
            biased;
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => Err(AgentError::Cancelled),
            result = tokio::time::timeout(remaining, fut) => {
                result.map_err(|_| AgentError::QueryTimeout { timeout_secs })
            }
        }
    }

    /// Cancel the in-flight query, if any. Takes effect at the next
    /// suspension point.
    pub fn cancel_current(&self) {
        self.cancel_tx.send_replace(true);
    }

    // ─── Conversation Operations ────────────────────────────────────────

    /// Empty the transcript and mint a new thread ID.
    pub fn clear(&self) -> Result<(), AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        state.conversation.clear();
        Ok(())
    }

    /// The current thread identity.
    pub fn thread_id(&self) -> Result<String, AgentError> {
        let state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        Ok(state.conversation.thread_id().to_string())
    }

    /// Reconfigure the retention bound and re-trim immediately.
    pub fn set_max_exchanges(&self, max_exchanges: Option<usize>) -> Result<(), AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        state.conversation.set_max_exchanges(max_exchanges);
        Ok(())
    }

    /// Snapshot the conversation for external storage.
    pub fn snapshot(&self) -> Result<ConversationSnapshot, AgentError> {
        let state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        Ok(persistence::to_snapshot(&state.conversation))
    }

    /// Restore the conversation from a host blob. Fails closed on malformed
    /// snapshots, leaving the current conversation untouched.
    pub fn restore(&self, blob: serde_json::Value) -> Result<(), AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        let snapshot = persistence::snapshot_from_value(blob)?;
        state.conversation = persistence::from_snapshot(snapshot, self.options.max_exchanges);
        tracing::info!(
            thread_id = %state.conversation.thread_id(),
            message_count = state.conversation.len(),
            "conversation restored"
        );
        Ok(())
    }

    /// Tear the runtime down, retiring the tool gateway. Idempotent.
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        let mut state = self.state.try_lock().map_err(|_| AgentError::Busy)?;
        if let Some(mut handle) = state.handle.take() {
            handle.tools.cleanup().await;
            tracing::info!("agent runtime shut down");
        }
        self.set_active_kind(None);
        Ok(())
    }
}

/// Render a model output as the `ModelEnd` event payload.
fn model_output_to_value(output: &ModelOutput) -> serde_json::Value {
    match output {
        ModelOutput::FinalAnswer(content) => serde_json::json!({
            "kind": "final_answer",
            "content": content,
        }),
        ModelOutput::ToolCalls(calls) => serde_json::json!({
            "kind": "tool_calls",
            "calls": calls
                .iter()
                .map(|c| serde_json::json!({"name": c.name, "input": c.input}))
                .collect::<Vec<_>>(),
        }),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
