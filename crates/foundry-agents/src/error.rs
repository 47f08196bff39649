use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Run {run_id} did not finish within {elapsed:?}")]
    PollTimeout { run_id: String, elapsed: Duration },

    #[error("Run {run_id} still running after {attempts} status checks")]
    PollAttemptsExhausted { run_id: String, attempts: u32 },
}

impl AgentsError {
    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentsError>;
