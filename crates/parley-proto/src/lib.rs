//! Parley wire protocol
//!
//! Types exchanged with the feedback server: the [`Message`] broadcast to every
//! participant of a conversation, the [`SendMessage`] request a client emits,
//! and the [`Envelope`] that frames both on the live channel.
//!
//! # Wire format
//!
//! Every live-channel frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Field names follow the server's JSON keys (`slug`, `name`, `message`,
//! `clientIp`, `createdAt`); the Rust side uses descriptive names.
//!
//! # Invariants
//!
//! - A [`SendMessage`] can only be built from a trimmed, non-empty body and an
//!   author of 1 to [`MAX_AUTHOR_CHARS`] characters.
//! - Decoding never fails on unknown event names; they surface as
//!   [`Envelope::Unknown`] so newer servers do not break older clients.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod message;
pub mod payloads;

pub use envelope::{Envelope, EventName, RawEnvelope};
pub use errors::{ProtocolError, Result};
pub use message::{
    MAX_AUTHOR_CHARS, Message, MessageId, RequestId, Scope, normalize_author, normalize_body,
};
pub use payloads::{PollBatch, SendMessage};
