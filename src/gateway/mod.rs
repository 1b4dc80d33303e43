//! Tool Gateway — connects to external tool-capability providers.
//!
//! Providers are child processes launched from a manifest entry
//! (command + args + env) and spoken to over line-delimited JSON-RPC.
//! The gateway aggregates their tools into one invocable catalog and owns
//! their lifecycle.

pub mod client;
pub mod errors;
pub mod lifecycle;
pub mod registry;
pub mod transport;
pub mod types;

pub use client::{ToolGateway, ToolInvoker};
pub use errors::GatewayError;
pub use registry::ToolRegistry;
pub use types::{ServerConfig, ServersConfig, ToolDescriptor};
