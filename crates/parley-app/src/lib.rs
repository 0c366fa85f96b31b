//! Application layer for Parley
//!
//! Pure state machines and a generic runtime for conversation views, enabling
//! deterministic tests with the same code that runs in production.
//!
//! # Components
//!
//! - [`ConversationView`]: One open conversation (log, draft, send state)
//! - [`OriginHeuristic`]: Infers which messages this client authored
//! - [`DeliveryTracker`]: Matches sends to their echoes, times them out
//! - [`Conversations`]: Hosts open views, discards results for closed ones
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod conversations;
mod delivery;
mod driver;
mod event;
mod identity;
mod input;
mod runtime;
mod state;
mod view;

pub use action::ViewAction;
pub use conversations::{Conversations, ViewToken};
pub use delivery::{DeliveryState, DeliveryTracker, PendingSend};
pub use driver::Driver;
pub use event::ViewEvent;
pub use identity::OriginHeuristic;
pub use input::UserInput;
pub use runtime::Runtime;
pub use state::{DEFAULT_AUTHOR, LoadState, LoadTicket, LogEntry, Rejection, ViewConfig};
pub use view::ConversationView;
