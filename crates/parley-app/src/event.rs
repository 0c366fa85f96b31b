//! View input events.
//!
//! This module defines [`ViewEvent`], the results of I/O that drive the
//! [`crate::ConversationView`] state machine. User interactions go through
//! the view's methods instead.

use std::time::Instant;

use parley_client::{ConnectionError, LoadError};
use parley_proto::{Message, RequestId};

use crate::LoadTicket;

/// Events processed by the view state machine.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// History fetch completed.
    HistoryLoaded {
        /// Ticket of the load that completed.
        ticket: LoadTicket,
        /// Messages sorted ascending by `created_at`.
        messages: Vec<Message>,
    },

    /// History fetch failed.
    HistoryFailed {
        /// Ticket of the load that failed.
        ticket: LoadTicket,
        /// Failure cause.
        error: LoadError,
    },

    /// Message pushed on the shared connection. Any scope.
    MessagePushed(Message),

    /// The emit call for a send request returned.
    SendDispatched {
        /// Id of the request that was emitted.
        request_id: Option<RequestId>,
        /// Whether the request reached the transport queue.
        result: Result<(), ConnectionError>,
    },

    /// Periodic tick for delivery timeouts.
    Tick {
        /// Current time.
        now: Instant,
    },
}
