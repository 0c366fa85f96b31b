//! Client configuration.

use std::{fmt, str::FromStr, time::Duration};

use url::Url;

use crate::ConfigError;

/// Live-channel transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Persistent WebSocket. Lowest latency.
    WebSocket,
    /// HTTP long-polling. Works through proxies that block upgrades.
    Polling,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => f.write_str("websocket"),
            Self::Polling => f.write_str("polling"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "polling" | "poll" => Ok(Self::Polling),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

/// Reconnect delay policy for the transport task.
///
/// Delays start at `initial` and double after each failed attempt, capped at
/// `max`. A successful connection resets the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// First delay after a failure.
    pub initial: Duration,
    /// Upper bound on the delay.
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self { initial: Duration::from_secs(1), max: Duration::from_secs(30) }
    }
}

/// Configuration for the shared connection and history loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit server endpoint. `None` falls back to `origin`.
    pub endpoint: Option<Url>,
    /// Origin of the hosting page, used when no endpoint is configured.
    pub origin: Url,
    /// Transports in preference order. The first one that completes a
    /// handshake is used.
    pub transports: Vec<TransportKind>,
    /// Server-side hold time requested for each long-poll.
    pub poll_timeout: Duration,
    /// Reconnect policy.
    pub reconnect: BackoffConfig,
}

impl ClientConfig {
    /// Create a configuration for the given page origin with default
    /// transport order (WebSocket, then polling).
    pub fn new(origin: Url) -> Self {
        Self {
            endpoint: None,
            origin,
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
            poll_timeout: Duration::from_secs(25),
            reconnect: BackoffConfig::default(),
        }
    }

    /// Set an explicit server endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<Url>) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Restrict and order the transports.
    pub fn with_transports(mut self, transports: Vec<TransportKind>) -> Result<Self, ConfigError> {
        if transports.is_empty() {
            return Err(ConfigError::NoTransports);
        }
        self.transports = transports;
        Ok(self)
    }

    /// Server base URL: the endpoint if configured, otherwise the origin.
    pub fn base_url(&self) -> &Url {
        self.endpoint.as_ref().unwrap_or(&self.origin)
    }

    /// Base URL with `segments` appended as path segments.
    ///
    /// Segments are percent-encoded, so a scope slug can never escape its
    /// path position.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, ConfigError> {
        let base = self.base_url();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::UnsupportedScheme(base.scheme().to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Parse and validate an `http`/`https` URL.
    pub fn parse_url(input: &str) -> Result<Url, ConfigError> {
        let url = Url::parse(input)
            .map_err(|e| ConfigError::InvalidUrl { url: input.to_string(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}
