//! Live-channel event framing.
//!
//! The live channel carries named events. Frames are JSON objects with an
//! `event` name and a `data` payload; [`RawEnvelope`] is that shape and
//! [`Envelope`] is its typed interpretation.

use serde::{Deserialize, Serialize};

use crate::{
    Message, SendMessage,
    errors::{ProtocolError, Result},
};

/// Named events understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Client to server: broadcast a message.
    SendMessage,
    /// Server to client: a message was accepted and broadcast.
    NewMessage,
}

impl EventName {
    /// Name used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendMessage => "chat:send",
            Self::NewMessage => "chat:newMessage",
        }
    }

    /// Parse a wire name. `None` for events this client does not know.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "chat:send" => Some(Self::SendMessage),
            "chat:newMessage" => Some(Self::NewMessage),
            _ => None,
        }
    }
}

/// Untyped frame as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Typed live-channel event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Outbound send request.
    SendMessage(SendMessage),
    /// Inbound broadcast message.
    NewMessage(Message),
    /// Event this client does not understand.
    Unknown {
        /// Wire name of the event.
        event: String,
    },
}

impl Envelope {
    /// Wire name of this event.
    pub fn event_name(&self) -> &str {
        match self {
            Self::SendMessage(_) => EventName::SendMessage.as_str(),
            Self::NewMessage(_) => EventName::NewMessage.as_str(),
            Self::Unknown { event } => event,
        }
    }

    /// Convert into the untyped wire shape.
    pub fn to_raw(&self) -> Result<RawEnvelope> {
        let data = match self {
            Self::SendMessage(request) => serde_json::to_value(request)?,
            Self::NewMessage(message) => serde_json::to_value(message)?,
            Self::Unknown { .. } => serde_json::Value::Null,
        };
        Ok(RawEnvelope { event: self.event_name().to_string(), data })
    }

    /// Interpret an untyped frame.
    ///
    /// Unknown event names decode to [`Envelope::Unknown`]. A known event with
    /// a payload of the wrong shape is an error.
    pub fn from_raw(raw: RawEnvelope) -> Result<Self> {
        let Some(name) = EventName::parse(&raw.event) else {
            return Ok(Self::Unknown { event: raw.event });
        };

        let malformed = |source| ProtocolError::MalformedPayload { event: raw.event.clone(), source };
        match name {
            EventName::SendMessage => {
                serde_json::from_value(raw.data.clone()).map(Self::SendMessage).map_err(malformed)
            },
            EventName::NewMessage => {
                serde_json::from_value(raw.data.clone()).map(Self::NewMessage).map_err(malformed)
            },
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_raw()?)?)
    }

    /// Decode a JSON text frame.
    pub fn decode(text: &str) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scope;

    #[test]
    fn event_names_match_server() {
        assert_eq!(EventName::SendMessage.as_str(), "chat:send");
        assert_eq!(EventName::NewMessage.as_str(), "chat:newMessage");
        assert_eq!(EventName::parse("chat:newMessage"), Some(EventName::NewMessage));
        assert_eq!(EventName::parse("connect"), None);
    }

    #[test]
    fn send_frame_layout() {
        let request = SendMessage::new(Scope::new("demo"), "mina", "hi", None).unwrap();
        let text = Envelope::SendMessage(request).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "event": "chat:send",
                "data": {"slug": "demo", "name": "mina", "message": "hi"}
            })
        );
    }

    #[test]
    fn unknown_events_are_not_errors() {
        let envelope = Envelope::decode(r#"{"event":"presence","data":{"count":3}}"#).unwrap();
        assert_eq!(envelope, Envelope::Unknown { event: "presence".into() });
    }

    #[test]
    fn known_event_with_bad_payload_is_malformed() {
        let err = Envelope::decode(r#"{"event":"chat:newMessage","data":{"slug":1}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { ref event, .. } if event == "chat:newMessage"));
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(Envelope::decode("not json"), Err(ProtocolError::Json(_))));
    }
}
