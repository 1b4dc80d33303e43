//! Companion Engine — an embeddable conversation and tool-orchestration
//! runtime.
//!
//! The engine turns a user query into zero-or-more tool invocations against
//! externally discovered capability providers, feeds results back to a
//! language model, and returns a final answer, while persisting multi-turn
//! state across restarts. Host shells (editor plugins, desktop apps, TUIs)
//! drive it through [`agent::AgentRuntime`].
//!
//! ```no_run
//! use companion_engine::agent::{AgentRuntime, RuntimeOptions};
//! use companion_engine::gateway::ServersConfig;
//! use companion_engine::provider::{ProviderKind, ProviderSettings};
//!
//! # async fn run() -> Result<(), companion_engine::agent::AgentError> {
//! let runtime = AgentRuntime::new(ProviderSettings::default(), RuntimeOptions::default());
//! runtime
//!     .initialize(ProviderKind::Local, None, ServersConfig::default(), None)
//!     .await?;
//! let answer = runtime.process_query("List the files in my vault").await?;
//! println!("{answer}");
//! runtime.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod provider;

pub use agent::{AgentError, AgentEvent, AgentRuntime, EventSink, RuntimeOptions};
pub use config::{load_engine_config, load_servers_config, EngineConfig};
pub use gateway::{GatewayError, ServersConfig, ToolDescriptor, ToolGateway, ToolInvoker};
pub use provider::{ModelClient, ProviderError, ProviderKind, ProviderSettings};
