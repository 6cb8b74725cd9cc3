//! Process-wide context, built once at startup and passed to every command

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use agentwire_a2a::{AgentClient, AgentRegistry, PeerAgentConfig};

use crate::config::Config;

pub struct AppContext {
    pub config: Config,
    pub registry: AgentRegistry,
}

impl AppContext {
    /// Build the shared HTTP client and registry.
    ///
    /// `overrides` are applied after the config file's agents.
    pub fn build(config: Config, overrides: &[(String, String)]) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        let peers = config.agents.iter().cloned().map(PeerAgentConfig::from);
        let mut registry =
            AgentRegistry::from_peers(http, peers).context("Invalid [[agents]] entry in config")?;

        for (name, url) in overrides {
            registry
                .register_agent(name, url)
                .with_context(|| format!("Invalid --agent-url for '{}'", name))?;
        }

        info!("Context ready: {} agents registered", registry.len());
        Ok(Self { config, registry })
    }

    pub fn client(&self, name: &str) -> Result<AgentClient> {
        self.registry.get_agent_client(name).with_context(|| {
            let known = self.registry.names();
            if known.is_empty() {
                "No agents configured".to_string()
            } else {
                format!("Known agents: {}", known.join(", "))
            }
        })
    }
}
