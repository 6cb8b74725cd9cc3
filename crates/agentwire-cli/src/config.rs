//! Configuration file loading: `~/.agentwire/config.toml`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use agentwire_a2a::PeerAgentConfig;

/// Environment variable that overrides the default config location
pub const CONFIG_ENV: &str = "AGENTWIRE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

/// Transport settings for the shared HTTP client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; unset means no timeout
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    /// Agent used by `agentwire chat` when none is given
    pub agent: Option<String>,
    pub user_id: Option<String>,
}

/// `[[agents]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub url: String,
}

impl From<AgentEntry> for PeerAgentConfig {
    fn from(entry: AgentEntry) -> Self {
        PeerAgentConfig {
            name: entry.name,
            url: entry.url,
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Load configuration.
    ///
    /// An explicit path (flag or `AGENTWIRE_CONFIG`) must exist. The default
    /// location is optional and yields an empty config when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let path = match explicit {
            Some(path) => path,
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(
            "Loaded config from {} ({} agents)",
            path.display(),
            config.agents.len()
        );
        Ok(config)
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agentwire").join("config.toml"))
}
