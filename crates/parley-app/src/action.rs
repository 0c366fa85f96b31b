//! View side-effects and intents.
//!
//! This module defines the [`ViewAction`] enum, which represents instructions
//! produced by the [`crate::ConversationView`] state machine for the runtime
//! to execute.

use parley_proto::{Scope, SendMessage};

use crate::LoadTicket;

/// Actions produced by the view state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Render the view.
    Render,

    /// Fetch the history for a scope.
    LoadHistory {
        /// Conversation to load.
        scope: Scope,
        /// Identifies this load; results for older tickets are ignored.
        ticket: LoadTicket,
    },

    /// Emit a send request on the shared connection.
    Emit(SendMessage),
}
