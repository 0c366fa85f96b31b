//! Request and response payloads.

use serde::{Deserialize, Serialize};

use crate::{
    RawEnvelope, RequestId, Scope,
    errors::Result,
    message::{normalize_author, normalize_body},
};

/// Request to broadcast a message to a conversation.
///
/// # Invariants
///
/// - `author` is trimmed and 1 to [`crate::MAX_AUTHOR_CHARS`] characters.
/// - `body` is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    /// Target conversation.
    #[serde(rename = "slug")]
    pub scope: Scope,
    /// Sender display name.
    #[serde(rename = "name")]
    pub author: String,
    /// Text content.
    #[serde(rename = "message")]
    pub body: String,
    /// Correlates the request with its echo. Servers may ignore it.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl SendMessage {
    /// Build a validated send request, trimming author and body.
    pub fn new(
        scope: Scope,
        author: &str,
        body: &str,
        request_id: Option<RequestId>,
    ) -> Result<Self> {
        Ok(Self {
            scope,
            author: normalize_author(author)?,
            body: normalize_body(body)?,
            request_id,
        })
    }
}

/// Response to a long-poll request on the polling transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollBatch {
    /// Cursor to pass to the next poll.
    pub cursor: u64,
    /// Events delivered since the previous cursor, in server order.
    #[serde(default)]
    pub events: Vec<RawEnvelope>,
}
