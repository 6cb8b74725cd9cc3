//! A2A (Agent-to-Agent) client support for agentwire
//!
//! Discovers a peer agent's capabilities from `/.well-known/agent.json`,
//! invokes it over HTTP (`/run` or advertised custom endpoints), and resolves
//! logical agent names to URLs through a local registry.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;

pub use client::AgentClient;
pub use error::{A2aError, Result};
pub use protocol::{AgentCapabilities, AgentCard, AgentMetadata, AgentSkill, RunRequest};
pub use registry::{AgentRegistry, PeerAgentConfig};
