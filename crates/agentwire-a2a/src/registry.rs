//! Agent registry: maps logical agent names to base URLs
//!
//! Entries are registered explicitly at startup; nothing is persisted or
//! discovered automatically. Every lookup hands back a fresh [`AgentClient`].

use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::client::AgentClient;
use crate::error::{A2aError, Result};

/// A named peer agent, as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAgentConfig {
    pub name: String,
    pub url: String,
}

/// In-memory name → URL registry
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, String>,
    http: Client,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose clients share the given HTTP connection pool
    pub fn with_http(http: Client) -> Self {
        Self {
            agents: HashMap::new(),
            http,
        }
    }

    /// Build a registry from configured peers; later duplicates win
    pub fn from_peers<I>(http: Client, peers: I) -> Result<Self>
    where
        I: IntoIterator<Item = PeerAgentConfig>,
    {
        let mut registry = Self::with_http(http);
        for peer in peers {
            registry.register_agent(&peer.name, &peer.url)?;
        }
        info!("Agent registry loaded with {} agents", registry.len());
        Ok(registry)
    }

    /// Register or overwrite an agent. The URL is not contacted.
    pub fn register_agent(&mut self, name: &str, url: &str) -> Result<()> {
        if name.is_empty() {
            return Err(A2aError::InvalidArgument("agent name must not be empty".into()));
        }
        if url.is_empty() {
            return Err(A2aError::InvalidArgument(format!(
                "URL for agent '{}' must not be empty",
                name
            )));
        }

        if let Some(previous) = self.agents.insert(name.to_string(), url.to_string()) {
            debug!("Agent '{}' re-registered: {} -> {}", name, previous, url);
        } else {
            debug!("Agent '{}' registered at {}", name, url);
        }
        Ok(())
    }

    pub fn get_agent_url(&self, name: &str) -> Result<&str> {
        self.agents
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| A2aError::AgentNotRegistered(name.to_string()))
    }

    /// New client for `name`, with its own empty metadata cache
    pub fn get_agent_client(&self, name: &str) -> Result<AgentClient> {
        let url = self.get_agent_url(name)?;
        Ok(AgentClient::with_http(url, self.http.clone()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
