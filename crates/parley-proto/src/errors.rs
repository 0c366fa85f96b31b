//! Protocol error types.

use thiserror::Error;

use crate::MAX_AUTHOR_CHARS;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building, encoding or decoding wire types.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Author name is empty or longer than the allowed length after trimming.
    #[error("author name must be 1 to {max} characters, got {0}", max = MAX_AUTHOR_CHARS)]
    InvalidAuthor(usize),

    /// Message body is empty after trimming.
    #[error("message body is empty")]
    EmptyBody,

    /// Envelope payload does not match the shape its event name requires.
    #[error("malformed {event} payload: {source}")]
    MalformedPayload {
        /// Event name the payload was decoded for.
        event: String,
        /// Underlying decode failure.
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Returns true if the error was caused by local input rather than bytes
    /// received from the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidAuthor(_) | Self::EmptyBody)
    }
}
