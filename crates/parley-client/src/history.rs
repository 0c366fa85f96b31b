//! History loading.
//!
//! The server does not promise any order for a conversation's backlog, so
//! [`HistoryLoader::load_history`] always sorts ascending by `created_at`
//! before returning. Implementors only provide [`HistoryLoader::fetch`].

use async_trait::async_trait;
use parley_proto::{Message, Scope};

use crate::LoadError;

/// Request/response access to a conversation's backlog.
#[async_trait]
pub trait HistoryLoader: Send + Sync {
    /// Fetch the backlog for `scope` in whatever order the server returns it.
    async fn fetch(&self, scope: &Scope) -> Result<Vec<Message>, LoadError>;

    /// Fetch the backlog for `scope`, sorted ascending by `created_at`.
    async fn load_history(&self, scope: &Scope) -> Result<Vec<Message>, LoadError> {
        let mut messages = self.fetch(scope).await?;
        sort_history(&mut messages);
        tracing::debug!(%scope, count = messages.len(), "history loaded");
        Ok(messages)
    }
}

/// Sort messages ascending by `created_at`.
///
/// The sort is stable: messages with equal timestamps keep the order the
/// server sent them in.
pub fn sort_history(messages: &mut [Message]) {
    messages.sort_by_key(|message| message.created_at);
}

#[cfg(feature = "transport")]
pub use http::HttpHistoryLoader;

#[cfg(feature = "transport")]
mod http {
    use async_trait::async_trait;
    use parley_proto::{Message, Scope};

    use super::HistoryLoader;
    use crate::{ClientConfig, LoadError};

    /// History loader over `GET {base}/api/feedbacks/{slug}`.
    #[derive(Debug, Clone)]
    pub struct HttpHistoryLoader {
        client: reqwest::Client,
        config: ClientConfig,
    }

    impl HttpHistoryLoader {
        /// Create a loader for the configured endpoint.
        pub fn new(config: ClientConfig) -> Self {
            Self { client: reqwest::Client::new(), config }
        }

        /// Create a loader sharing an existing HTTP client.
        pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
            Self { client, config }
        }
    }

    #[async_trait]
    impl HistoryLoader for HttpHistoryLoader {
        async fn fetch(&self, scope: &Scope) -> Result<Vec<Message>, LoadError> {
            let url = self
                .config
                .url_for(&["api", "feedbacks", scope.as_str()])
                .map_err(|e| LoadError::Transport(e.to_string()))?;

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| LoadError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(%scope, %status, "history request rejected");
                return Err(LoadError::Status(status.as_u16()));
            }

            let body = response.bytes().await.map_err(|e| LoadError::Transport(e.to_string()))?;
            serde_json::from_slice(&body).map_err(|e| LoadError::Decode(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_proto::MessageId;

    use super::*;

    fn at(id: &str, minute: u32) -> Message {
        Message {
            id: Some(MessageId::new(id)),
            scope: Scope::new("demo"),
            author: "mina".into(),
            body: id.into(),
            origin_hint: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 12, 12, minute, 0).unwrap(),
            request_id: None,
        }
    }

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().filter_map(|m| m.id.as_ref().map(MessageId::as_str)).collect()
    }

    #[test]
    fn sorts_by_created_at() {
        let mut messages = vec![at("c", 2), at("a", 0), at("b", 1)];
        sort_history(&mut messages);
        assert_eq!(ids(&messages), ["a", "b", "c"]);
    }

    #[test]
    fn equal_timestamps_keep_server_order() {
        let mut messages = vec![at("y", 5), at("x", 5), at("w", 1)];
        sort_history(&mut messages);
        assert_eq!(ids(&messages), ["w", "y", "x"]);
    }
}
