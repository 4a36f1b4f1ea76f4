//! Error types for the analysis client
//!
//! One enum per concern, joined by [`ForgeError`] for callers that want a
//! single type. The orchestrator never surfaces these directly to users; it
//! turns them into a [`crate::job::JobFailure`] with a textual message.

use thiserror::Error;

use crate::graph::RiskLevel;
use crate::job::JobState;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Umbrella error for the whole crate
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("job error: {0}")]
    Job(#[from] InvalidTransition),
}

/// Failures talking to the remote analysis service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced an HTTP response (connection refused,
    /// timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// The response body did not match the wire contract.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether a retry on the next tick could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }

    /// Text suitable for showing to the user.
    ///
    /// Rejections carry the service's own `error` field, which is already
    /// written for humans.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            Self::Transport(message) | Self::NotFound(message) | Self::Decode(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => "Analysis failed. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Invariant violations found while building a Graph Model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("node '{id}' has risk level {risk} but no failure reason")]
    MissingFailureReason { id: String, risk: RiskLevel },
}

/// Invalid client configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// An event the job state machine does not accept in its current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot apply {event} while {from}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub event: &'static str,
}
