//! Error types for the Alibi game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Alibi workspace.
///
/// Remote failures (`NetworkFailure`, `Timeout`, `ServerError`, `SessionLost`)
/// come from the question service. `InvalidInput` is raised at the command
/// boundary and never mutates session state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlibiError {
    /// The remote service could not be reached
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The remote service did not answer in time
    #[error("Request timed out")]
    Timeout,

    /// The remote service answered with an error status or an unusable body
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The remote service evicted the conversation state for this player
    #[error("Remote session lost")]
    SessionLost,

    /// A command was rejected before touching session state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AlibiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NetworkFailure error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure(message.into())
    }

    /// Creates a ServerError
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if the remote side dropped our conversation
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::SessionLost)
    }

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<toml::de::Error> for AlibiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML: {}", err))
    }
}

/// A type alias for `Result<T, AlibiError>`.
pub type Result<T> = std::result::Result<T, AlibiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(AlibiError::SessionLost.is_session_lost());
        assert!(!AlibiError::Timeout.is_session_lost());
        assert!(AlibiError::invalid_input("name").is_invalid_input());
    }

    #[test]
    fn test_toml_error_is_config() {
        let err: AlibiError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, AlibiError::Config(msg) if msg.starts_with("TOML: ")));
    }

    #[test]
    fn test_display() {
        let err = AlibiError::server(500, "Failed to get response from AI");
        assert_eq!(
            err.to_string(),
            "Server error (500): Failed to get response from AI"
        );
    }
}
