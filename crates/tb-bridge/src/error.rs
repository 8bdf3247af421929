//! Inference errors.

use std::time::Duration;

use tb_core::{ConfigError, Traced};

/// Failure of a call across the host boundary.
///
/// Never retried by the bridge; the caller's own retry logic decides.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Host inference failed: {0}")]
    Host(String),

    #[error("Host inference engine unavailable: {0}")]
    Unavailable(String),

    #[error("Host inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference endpoint returned {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse inference response: {0}")]
    Parse(String),

    #[error("Inference returned an empty response")]
    EmptyResponse,

    #[error("Failed to start scheduler: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl InferenceError {
    /// Whether the host missed its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout(_))
    }

    /// Short variant name, stable across messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            InferenceError::Host(_) => "HostError",
            InferenceError::Unavailable(_) => "HostUnavailable",
            InferenceError::Timeout(_) => "InferenceTimeout",
            InferenceError::Transport { .. } => "TransportError",
            InferenceError::Network(_) => "NetworkError",
            InferenceError::Parse(_) => "ParseError",
            InferenceError::EmptyResponse => "EmptyResponse",
            InferenceError::Runtime(_) => "RuntimeError",
            InferenceError::Config(_) => "ConfigError",
        }
    }
}

impl Traced for InferenceError {
    fn kind(&self) -> &str {
        self.kind_name()
    }
}
