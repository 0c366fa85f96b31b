//! Client
//!
//! Connection plumbing for the Parley feedback channel: one shared live
//! connection per process, a history loader per request/response API, and
//! the transports that move envelopes between them and the server.
//!
//! # Architecture
//!
//! [`Connection`] is a cheap, cloneable handle. It owns the outbound queue and
//! the registry of push subscribers; it does not own any socket. A transport
//! task drains the outbound queue and feeds decoded envelopes back through
//! [`Connection::dispatch`]. Swapping the transport (or faking it in tests) is
//! therefore invisible to everything holding a [`Connection`].
//!
//! # Components
//!
//! - [`ConnectionManager`]: Lazily creates and then reuses the one connection
//! - [`Connection`] / [`Subscription`]: Shared handle and per-view push feed
//! - [`HistoryLoader`]: Ordered backlog fetch for one conversation scope
//! - [`ClientConfig`]: Endpoint, transport order and reconnect policy
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::NetworkConnector`]: WebSocket with long-polling fallback
//! - [`history::HttpHistoryLoader`]: History over HTTP

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod connection;
mod error;
pub mod history;
mod manager;

#[cfg(feature = "transport")]
pub mod transport;

pub use config::{BackoffConfig, ClientConfig, TransportKind};
pub use connection::{Connection, ConnectionStatus, OutboundQueue, Subscription};
pub use error::{ConfigError, ConnectionError, LoadError};
pub use history::{HistoryLoader, sort_history};
pub use manager::{ConnectionManager, Connector};
pub use parley_proto::{Message, MessageId, RequestId, Scope, SendMessage};
