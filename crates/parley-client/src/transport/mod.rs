//! Network transports for the shared connection.
//!
//! [`NetworkConnector`] spawns one task per process that owns the socket. The
//! task walks the configured transport list in order until one completes a
//! handshake (WebSocket first by default, long-polling as fallback), then
//! stays on it and reconnects with capped exponential backoff whenever the
//! link drops. Envelopes emitted while disconnected stay queued.

mod polling;
mod websocket;

use std::time::Duration;

use parley_proto::{Envelope, ProtocolError};
use thiserror::Error;

use crate::{
    BackoffConfig, ClientConfig, ConfigError, Connection, ConnectionStatus, Connector,
    OutboundQueue, TransportKind,
};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake with the server failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Established stream failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// Server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// HTTP request failed (polling transport).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Envelope could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Endpoint URL could not be derived.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Connector that runs the WebSocket/polling transport task.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct NetworkConnector {
    http: reqwest::Client,
}

impl NetworkConnector {
    /// Create a connector with its own HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Connector for NetworkConnector {
    fn connect(&self, config: &ClientConfig) -> Connection {
        let (connection, outbound) = Connection::new();
        tokio::spawn(run(config.clone(), self.http.clone(), connection.clone(), outbound));
        connection
    }
}

/// Capped exponential backoff.
#[derive(Debug, Clone)]
struct Backoff {
    config: BackoffConfig,
    next: Duration,
}

impl Backoff {
    fn new(config: BackoffConfig) -> Self {
        Self { config, next: config.initial }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.config.max);
        delay
    }

    fn reset(&mut self) {
        self.next = self.config.initial;
    }
}

/// Transport task. Runs until every handle to the outbound queue's sender is
/// gone.
async fn run(
    config: ClientConfig,
    http: reqwest::Client,
    connection: Connection,
    mut outbound: OutboundQueue,
) {
    let mut backoff = Backoff::new(config.reconnect);
    let mut index = 0;
    let mut established = false;
    let mut cursor = 0;

    loop {
        let Some(&kind) = config.transports.get(index) else {
            tracing::error!("no transport configured; live channel disabled");
            return;
        };

        let result = match kind {
            TransportKind::WebSocket => match websocket::connect(&config).await {
                Ok(stream) => {
                    established = true;
                    backoff.reset();
                    connection.set_status(ConnectionStatus::Connected(kind));
                    websocket::serve(stream, &connection, &mut outbound).await
                },
                Err(e) if !established && index + 1 < config.transports.len() => {
                    index += 1;
                    tracing::warn!(error = %e, fallback = %config.transports[index], "transport unavailable, falling back");
                    continue;
                },
                Err(e) => Err(e),
            },
            TransportKind::Polling => {
                established = true;
                // Polling has no handshake; the first successful poll marks
                // the connection as up.
                polling::serve(
                    &http,
                    &config,
                    &connection,
                    &mut outbound,
                    &mut cursor,
                    &mut backoff,
                )
                .await
            },
        };

        match result {
            Ok(()) => {
                tracing::info!("outbound queue closed, stopping transport");
                return;
            },
            Err(e) => {
                connection.set_status(ConnectionStatus::Reconnecting);
                let delay = backoff.next_delay();
                tracing::warn!(error = %e, transport = %kind, ?delay, "live channel lost, reconnecting");
                tokio::time::sleep(delay).await;
            },
        }
    }
}

/// Decode a text frame and hand it to subscribers.
fn deliver(connection: &Connection, text: &str) {
    match Envelope::decode(text) {
        Ok(envelope) => connection.dispatch(envelope),
        Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
        });

        let delays: Vec<_> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, [1, 2, 4, 5, 5]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn undecodable_frames_are_dropped() {
        let (connection, _queue) = Connection::new();
        let mut sub = connection.subscribe();

        deliver(&connection, "{not json");

        assert!(sub.try_recv().is_none());
    }
}
