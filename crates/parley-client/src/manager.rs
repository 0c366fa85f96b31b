//! Transport connection manager.
//!
//! Owns the single live connection of the process. The first call to
//! [`ConnectionManager::get_connection`] asks the [`Connector`] to start one;
//! every later call returns a handle to that same connection.
//!
//! The manager does not retry or reconnect. Reconnection is the transport
//! task's job, and the handle stays valid across reconnects.

use std::sync::OnceLock;

use crate::{ClientConfig, Connection};

/// Starts a connection and whatever task keeps it alive.
pub trait Connector: Send + Sync {
    /// Create the connection for `config`.
    ///
    /// Called at most once per [`ConnectionManager`].
    fn connect(&self, config: &ClientConfig) -> Connection;
}

/// Lazily created, process-wide live connection.
pub struct ConnectionManager<C: Connector> {
    config: ClientConfig,
    connector: C,
    connection: OnceLock<Connection>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager. No connection is made until first use.
    pub fn new(config: ClientConfig, connector: C) -> Self {
        Self { config, connector, connection: OnceLock::new() }
    }

    /// Shared connection, created on first call.
    pub fn get_connection(&self) -> Connection {
        self.connection
            .get_or_init(|| {
                tracing::info!(endpoint = %self.config.base_url(), "opening shared connection");
                self.connector.connect(&self.config)
            })
            .clone()
    }

    /// Shared connection if one has been created.
    pub fn existing(&self) -> Option<&Connection> {
        self.connection.get()
    }

    /// Configuration the connection is created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::OutboundQueue;

    #[derive(Default)]
    struct CountingConnector {
        calls: AtomicUsize,
        queues: Mutex<Vec<OutboundQueue>>,
    }

    impl Connector for Arc<CountingConnector> {
        fn connect(&self, _config: &ClientConfig) -> Connection {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (connection, queue) = Connection::new();
            self.queues.lock().unwrap().push(queue);
            connection
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new(ClientConfig::parse_url("http://localhost:3000").unwrap())
    }

    #[test]
    fn connection_is_lazy() {
        let connector = Arc::new(CountingConnector::default());
        let manager = ConnectionManager::new(config(), Arc::clone(&connector));

        assert!(manager.existing().is_none());
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn connection_is_created_once() {
        let connector = Arc::new(CountingConnector::default());
        let manager = ConnectionManager::new(config(), Arc::clone(&connector));

        let first = manager.get_connection();
        let second = manager.get_connection();

        assert!(first.same_as(&second));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }
}
