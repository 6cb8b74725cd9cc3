//! Error taxonomy for A2A calls

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, A2aError>;

/// Errors surfaced by [`AgentClient`](crate::AgentClient) and
/// [`AgentRegistry`](crate::AgentRegistry).
///
/// Variants carrying a [`StatusCode`] mean the remote agent answered;
/// `Transport` and `Decode` mean it could not be reached or understood.
#[derive(Debug, Error)]
pub enum A2aError {
    #[error("failed to retrieve agent metadata: HTTP {status}")]
    MetadataFetch { status: StatusCode },

    #[error("agent request failed: HTTP {status} - {body}")]
    AgentRequest { status: StatusCode, body: String },

    #[error("endpoint '{endpoint}' not available on agent {agent}")]
    UnknownEndpoint { endpoint: String, agent: String },

    #[error("agent '{0}' not registered for discovery")]
    AgentNotRegistered(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON from agent: {0}")]
    Decode(#[from] serde_json::Error),
}

impl A2aError {
    /// HTTP status for errors where the agent actually responded
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::MetadataFetch { status } | Self::AgentRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the remote agent answered with a non-success status
    pub fn is_remote(&self) -> bool {
        self.status().is_some()
    }
}
