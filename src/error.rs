//! Error types for hutarka.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for hutarka operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hutarka operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Conversation not found.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// The endpoint could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint did not answer within the exchange budget.
    #[error("Request timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The endpoint answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The endpoint's answer did not match the reply schema.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl Error {
    /// Whether this error came from the network boundary.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Status { .. } | Self::Decode(_)
        )
    }
}
