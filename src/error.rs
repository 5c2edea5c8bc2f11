//! Crate-level error type.
//!
//! Malformed stream *data* never surfaces here: the SSE layers degrade it
//! to plain-text payloads. This type covers building a client and opening
//! its streams, so callers can match one enum instead of each layer's own.

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Error type for client construction and operations.
#[derive(Debug)]
pub enum AnimaError {
    /// Transport-level failure (connection, status, broken stream)
    Transport(TransportError),
    /// Invalid configuration
    Config(ConfigError),
}

impl std::fmt::Display for AnimaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimaError::Transport(e) => write!(f, "transport error: {}", e),
            AnimaError::Config(e) => write!(f, "config error: {}", e),
        }
    }
}

impl std::error::Error for AnimaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnimaError::Transport(e) => Some(e),
            AnimaError::Config(e) => Some(e),
        }
    }
}

impl From<TransportError> for AnimaError {
    fn from(e: TransportError) -> Self {
        AnimaError::Transport(e)
    }
}

impl From<ConfigError> for AnimaError {
    fn from(e: ConfigError) -> Self {
        AnimaError::Config(e)
    }
}
