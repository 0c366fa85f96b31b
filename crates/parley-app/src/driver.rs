//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from the terminal (or whatever
//! else reads user intents and shows the conversation). The network side is
//! not part of the driver: it lives behind the shared
//! [`parley_client::Connection`] and [`parley_client::HistoryLoader`].

use std::{future::Future, time::Instant};

use parley_client::ConnectionStatus;

use crate::{ConversationView, UserInput};

/// User-facing I/O for the runtime.
///
/// # Implementations
///
/// - **CLI**: reads commands and drafts line by line from stdin
/// - **Tests**: replays a script of inputs and records renders
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user intent.
    ///
    /// Returns `None` once the input source is exhausted, which stops the
    /// runtime. Must be cancel safe: the runtime polls it inside `select!`.
    fn next_input(&mut self) -> impl Future<Output = Result<Option<UserInput>, Self::Error>> + Send;

    /// Current time, used for delivery deadlines.
    fn now(&self) -> Instant {
        Instant::now()
    }

    /// Render the active conversation, or the idle screen if none is open.
    ///
    /// `status` is the shared connection's state, or `None` before any view
    /// has opened it.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn render(
        &mut self,
        view: Option<&ConversationView>,
        status: Option<ConnectionStatus>,
    ) -> Result<(), Self::Error>;

    /// Release resources before the runtime returns.
    fn stop(&mut self) {}
}
