//! A2A (Agent-to-Agent) wire types
//!
//! Agents advertise themselves at `/.well-known/agent.json` and accept work on
//! `POST /run`. The capability document is owned by the remote agent, so it is
//! kept as a loose JSON map with typed accessors on top.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path of the capability document, relative to an agent's base URL
pub const METADATA_PATH: &str = ".well-known/agent.json";

/// Path of the standard invocation endpoint
pub const RUN_PATH: &str = "run";

/// Key under which an agent lists its custom endpoints
pub const ENDPOINTS_KEY: &str = "endpoints";

/// Capability document served at `/.well-known/agent.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentMetadata(Map<String, Value>);

impl AgentMetadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Advertised custom endpoints.
    ///
    /// Accepts either an array of names or an object keyed by name. Returns
    /// `None` when the document has no endpoint list at all.
    pub fn endpoints(&self) -> Option<Vec<&str>> {
        match self.0.get(ENDPOINTS_KEY)? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            Value::Object(map) => Some(map.keys().map(String::as_str).collect()),
            _ => Some(Vec::new()),
        }
    }

    /// Whether `endpoint` may be called on this agent.
    ///
    /// An agent that publishes no endpoint list is not gated.
    pub fn advertises(&self, endpoint: &str) -> bool {
        match self.endpoints() {
            Some(list) => list.contains(&endpoint),
            None => true,
        }
    }

    /// Lenient typed view of the document, if it is shaped like an agent card
    pub fn card(&self) -> Option<AgentCard> {
        serde_json::from_value(Value::Object(self.0.clone())).ok()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Agent Card as published by A2A servers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
}

/// Optional protocol features an agent supports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

/// A skill listed on an agent card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Body of `POST /run`
///
/// `session_id` is always present on the wire, as `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub session_id: Option<String>,
}
