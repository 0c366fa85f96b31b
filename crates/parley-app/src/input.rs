//! Platform-agnostic user input.

use parley_proto::Scope;

/// User intents a driver can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Replace the draft text.
    Draft(String),
    /// Send the current draft.
    Submit,
    /// Change the display name.
    SetAuthorName(String),
    /// Retry control: reload a failed history, or resend the oldest failed
    /// message.
    Retry,
    /// Forget all failed sends.
    DismissFailed,
    /// Open a conversation, closing the current one.
    Open(Scope),
    /// Close the current conversation.
    Close,
    /// Quit the application.
    Quit,
}
