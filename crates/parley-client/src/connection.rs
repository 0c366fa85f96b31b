//! Shared live connection.
//!
//! A [`Connection`] is the process-wide handle every conversation view holds.
//! Views emit through it and subscribe to pushed messages on it. The transport
//! behind it is a separate task holding the [`OutboundQueue`].
//!
//! # Invariants
//!
//! - Dropping a [`Subscription`] unregisters it before the drop returns. A
//!   closed view can never receive another push, and the registry does not
//!   grow across open/close cycles.
//! - Messages are delivered to each subscriber in the order they were passed
//!   to [`Connection::dispatch`].

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_proto::{Envelope, Message, SendMessage};
use tokio::sync::{mpsc, watch};

use crate::{ConnectionError, TransportKind};

/// Live-channel status as reported by the transport task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// First connection attempt in progress.
    Connecting,
    /// Transport handshake completed.
    Connected(TransportKind),
    /// Connection lost; waiting to retry.
    Reconnecting,
}

/// Shared handle to the live channel.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

struct Shared {
    outbound: mpsc::UnboundedSender<Envelope>,
    registry: Mutex<Registry>,
    status: watch::Sender<ConnectionStatus>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: BTreeMap<u64, mpsc::UnboundedSender<Message>>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registry updates are single inserts/removes; a poisoned guard still
        // holds a consistent map.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transport side of a [`Connection`]: envelopes waiting to be written.
pub struct OutboundQueue {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl OutboundQueue {
    /// Next envelope to write. `None` once every [`Connection`] is dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Next envelope if one is already queued.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

impl Connection {
    /// Create a connection handle and the queue its transport drains.
    pub fn new() -> (Self, OutboundQueue) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let shared =
            Arc::new(Shared { outbound, registry: Mutex::new(Registry::default()), status });
        (Self { shared }, OutboundQueue { rx })
    }

    /// Queue a send request for the transport.
    ///
    /// Returns once the request is queued; there is no delivery guarantee.
    pub fn emit(&self, request: SendMessage) -> Result<(), ConnectionError> {
        self.shared
            .outbound
            .send(Envelope::SendMessage(request))
            .map_err(|_| ConnectionError::Closed)
    }

    /// Register for pushed messages of every scope.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.shared.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        tracing::debug!(subscription = id, "push subscriber registered");

        Subscription { id, rx, shared: Arc::clone(&self.shared) }
    }

    /// Deliver an inbound envelope to subscribers.
    ///
    /// Called by the transport for each decoded frame. Only new-message events
    /// reach subscribers; other events are logged and dropped.
    pub fn dispatch(&self, envelope: Envelope) {
        match envelope {
            Envelope::NewMessage(message) => self.deliver(&message),
            Envelope::SendMessage(_) => {
                tracing::debug!("ignoring send event received from server");
            },
            Envelope::Unknown { event } => {
                tracing::debug!(%event, "ignoring unknown event");
            },
        }
    }

    fn deliver(&self, message: &Message) {
        let mut registry = self.shared.registry();
        registry.subscribers.retain(|id, tx| {
            let open = tx.send(message.clone()).is_ok();
            if !open {
                tracing::debug!(subscription = id, "dropping closed subscriber");
            }
            open
        });
    }

    /// Number of registered push subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry().subscribers.len()
    }

    /// Latest transport status.
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Watch transport status changes.
    pub fn status_changes(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Record a transport status change.
    pub fn set_status(&self, status: ConnectionStatus) {
        let changed = self.shared.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
        if changed {
            tracing::info!(?status, "connection status changed");
        }
    }

    /// Returns true if both handles refer to the same physical connection.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.status())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Push feed for one open view.
///
/// Receives every pushed message regardless of scope; scope filtering is the
/// view's job. Unregisters on drop.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Message>,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Next pushed message. `None` if the subscription was pruned.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Next pushed message if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.registry().subscribers.remove(&self.id);
        tracing::debug!(subscription = self.id, "push subscriber removed");
    }
}
