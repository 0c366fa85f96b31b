//! Conversation messages and their identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ProtocolError, Result};

/// Maximum author name length, in characters.
pub const MAX_AUTHOR_CHARS: usize = 20;

/// Conversation identifier (a "slug").
///
/// Partitions messages into independent conversations. All views share one
/// connection, so every pushed message is matched against a view's scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Create a scope from a slug.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scope {
    fn from(slug: &str) -> Self {
        Self::new(slug)
    }
}

impl From<String> for Scope {
    fn from(slug: String) -> Self {
        Self(slug)
    }
}

/// Server-assigned message identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a server identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-generated identifier correlating a send request with its echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random request id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A message broadcast by the server.
///
/// Immutable once received. `origin_hint` is only meaningful to the local
/// authorship heuristic and is not an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id. Absent if the server did not provide one.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Conversation this message belongs to.
    #[serde(rename = "slug")]
    pub scope: Scope,
    /// Display name chosen by the sender. Not authenticated.
    #[serde(rename = "name")]
    pub author: String,
    /// Text content.
    #[serde(rename = "message")]
    pub body: String,
    /// Network origin attached by the server.
    #[serde(rename = "clientIp", default, skip_serializing_if = "Option::is_none")]
    pub origin_hint: Option<String>,
    /// Server receipt time.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Echo of the sender's request id, if the server supports it.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

/// Trim an author name and check its length.
pub fn normalize_author(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let chars = trimmed.chars().count();
    if chars == 0 || chars > MAX_AUTHOR_CHARS {
        return Err(ProtocolError::InvalidAuthor(chars));
    }
    Ok(trimmed.to_string())
}

/// Trim a message body, rejecting empty content.
pub fn normalize_body(body: &str) -> Result<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyBody);
    }
    Ok(trimmed.to_string())
}
