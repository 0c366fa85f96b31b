//! Local authorship heuristic.
//!
//! There is no authentication, so the only way to tell our own messages apart
//! is the network origin the server attaches to each broadcast. After this
//! client has sent something, the first pushed message carrying our display
//! name pins the origin; from then on a message is ours iff its origin
//! matches.
//!
//! Two clients behind the same origin are indistinguishable. A display name
//! change after the origin is pinned does not affect classification.

use parley_proto::Message;

/// Origin-matching heuristic for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginHeuristic {
    armed: bool,
    origin: Option<String>,
}

impl OriginHeuristic {
    /// Create an unarmed heuristic. Nothing is local until it captures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that this client submitted a message.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Inspect a pushed message, capturing its origin if it is the first echo
    /// of this client's own submission since arming.
    ///
    /// A message carrying a request id is ours only if `own_echo` says it
    /// settled one of our sends. Without a request id the display name is the
    /// only clue, so a message carrying `local_author` is taken as ours.
    ///
    /// Returns true if the origin was captured by this call.
    pub fn observe(&mut self, message: &Message, local_author: &str, own_echo: bool) -> bool {
        if !self.armed || self.origin.is_some() {
            return false;
        }
        let ours = match message.request_id {
            Some(_) => own_echo,
            None => message.author == local_author.trim(),
        };
        if !ours {
            return false;
        }
        let Some(origin) = &message.origin_hint else {
            return false;
        };

        tracing::debug!(%origin, "captured local origin");
        self.origin = Some(origin.clone());
        true
    }

    /// Whether `message` is attributed to this client.
    pub fn is_local(&self, message: &Message) -> bool {
        match (&self.origin, &message.origin_hint) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => false,
        }
    }

    /// Captured origin. `None` until the first local message is seen.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_proto::{RequestId, Scope};

    use super::*;

    fn from(author: &str, origin: Option<&str>) -> Message {
        Message {
            id: None,
            scope: Scope::new("demo"),
            author: author.into(),
            body: "hi".into(),
            origin_hint: origin.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap(),
            request_id: None,
        }
    }

    #[test]
    fn nothing_is_local_before_capture() {
        let heuristic = OriginHeuristic::new();
        assert!(!heuristic.is_local(&from("mina", Some("10.0.0.1"))));
    }

    #[test]
    fn unarmed_heuristic_does_not_capture() {
        let mut heuristic = OriginHeuristic::new();
        assert!(!heuristic.observe(&from("mina", Some("10.0.0.1")), "mina", false));
        assert_eq!(heuristic.origin(), None);
    }

    #[test]
    fn captures_first_matching_author_after_arming() {
        let mut heuristic = OriginHeuristic::new();
        heuristic.arm();

        assert!(!heuristic.observe(&from("joon", Some("10.0.0.2")), "mina", false));
        assert!(heuristic.observe(&from("mina", Some("10.0.0.1")), " mina ", false));
        assert!(!heuristic.observe(&from("mina", Some("10.0.0.9")), "mina", false));

        assert_eq!(heuristic.origin(), Some("10.0.0.1"));
    }

    #[test]
    fn classification_is_by_origin_only() {
        let mut heuristic = OriginHeuristic::new();
        heuristic.arm();
        heuristic.observe(&from("mina", Some("10.0.0.1")), "mina", false);

        assert!(heuristic.is_local(&from("someone else", Some("10.0.0.1"))));
        assert!(!heuristic.is_local(&from("mina", Some("10.0.0.2"))));
        assert!(!heuristic.is_local(&from("mina", None)));
    }

    #[test]
    fn message_without_origin_is_not_captured() {
        let mut heuristic = OriginHeuristic::new();
        heuristic.arm();

        assert!(!heuristic.observe(&from("mina", None), "mina", false));
        assert!(heuristic.observe(&from("mina", Some("10.0.0.1")), "mina", false));
    }

    #[test]
    fn namesake_with_foreign_request_id_is_not_captured() {
        let mut heuristic = OriginHeuristic::new();
        heuristic.arm();

        let mut namesake = from("Anonymous", Some("10.0.0.7"));
        namesake.request_id = Some(RequestId::new_v4());
        assert!(!heuristic.observe(&namesake, "Anonymous", false));

        let mut echo = from("Anonymous", Some("10.0.0.1"));
        echo.request_id = Some(RequestId::new_v4());
        assert!(heuristic.observe(&echo, "Anonymous", true));
        assert_eq!(heuristic.origin(), Some("10.0.0.1"));
    }

    #[test]
    fn own_echo_is_captured_under_any_name() {
        let mut heuristic = OriginHeuristic::new();
        heuristic.arm();

        let mut echo = from("renamed since", Some("10.0.0.1"));
        echo.request_id = Some(RequestId::new_v4());

        assert!(heuristic.observe(&echo, "mina", true));
    }
}
