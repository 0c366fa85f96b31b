//! Observable view state types.
//!
//! These structures serve as the "View Model" for rendering: what is loading,
//! what failed, and which log entries belong to the local user.

use std::{fmt, time::Duration};

use parley_client::LoadError;
use parley_proto::Message;

/// Default display name for a new session.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Tunables for conversation views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// How long a send may go unechoed before it is marked failed.
    pub ack_timeout: Duration,
    /// Display name a session starts with.
    pub default_author: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { ack_timeout: Duration::from_secs(10), default_author: DEFAULT_AUTHOR.to_string() }
    }
}

/// Identifies one history request of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub(crate) u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// History load status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Request in flight.
    Loading,
    /// History applied.
    Ready,
    /// Request failed; the view offers a retry.
    Failed(LoadError),
}

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Draft is empty after trimming.
    EmptyDraft,
    /// Display name is empty after trimming.
    EmptyAuthor,
    /// A previous send has not returned yet.
    SendInFlight,
}

/// A log message paired with its authorship classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry<'a> {
    /// The message.
    pub message: &'a Message,
    /// Whether the identity heuristic attributes it to this client.
    pub local: bool,
}
