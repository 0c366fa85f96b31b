//! Client error types.
//!
//! History and connection errors are kept as owned, cloneable values so they
//! can travel into view state and be rendered without holding transport types.

use thiserror::Error;

/// Errors from fetching a conversation's history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Request could not be sent or the response could not be read.
    #[error("history request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("history request returned status {0}")]
    Status(u16),

    /// Response body was not a list of messages.
    #[error("history response could not be decoded: {0}")]
    Decode(String),
}

impl LoadError {
    /// Returns true if retrying the same request may succeed.
    ///
    /// Network failures and server-side errors are transient. A client error
    /// status or an undecodable body will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => *code >= 500 || *code == 408 || *code == 429,
            Self::Decode(_) => false,
        }
    }
}

/// Errors from using the shared connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The transport task has exited and no longer drains the outbound queue.
    #[error("connection closed")]
    Closed,
}

/// Errors in client configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// URL could not be parsed.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// Input that failed to parse.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// URL scheme is not `http` or `https`.
    #[error("unsupported scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    /// Transport name is not recognised.
    #[error("unknown transport {0:?}, expected websocket or polling")]
    UnknownTransport(String),

    /// Transport list is empty.
    #[error("at least one transport must be enabled")]
    NoTransports,
}
