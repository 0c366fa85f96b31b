//! Host for open conversation views.
//!
//! Every open gets a fresh [`ViewToken`]. Results addressed to a token that
//! is no longer open are dropped, so a history load that completes after its
//! view closed leaves no trace, even if the same scope was reopened since.

use std::{collections::HashMap, fmt, time::Instant};

use parley_proto::Scope;

use crate::{ConversationView, ViewAction, ViewConfig, ViewEvent};

/// Identifies one open of a conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewToken(u64);

impl fmt::Display for ViewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Open conversation views, keyed by token.
#[derive(Debug)]
pub struct Conversations {
    config: ViewConfig,
    author_name: String,
    views: HashMap<ViewToken, ConversationView>,
    next_token: u64,
}

impl Conversations {
    /// Create an empty host. The display name starts at the configured
    /// default.
    pub fn new(config: ViewConfig) -> Self {
        let author_name = config.default_author.clone();
        Self { config, author_name, views: HashMap::new(), next_token: 0 }
    }

    /// Open a view for `scope`.
    ///
    /// Returns the view's token and the actions that request its history.
    pub fn open(&mut self, scope: Scope) -> (ViewToken, Vec<ViewAction>) {
        let token = ViewToken(self.next_token);
        self.next_token += 1;

        tracing::debug!(%token, %scope, "opening view");
        let (view, actions) =
            ConversationView::open(scope, &self.author_name, self.config.ack_timeout);
        self.views.insert(token, view);
        (token, actions)
    }

    /// Close a view. Later events for its token are ignored.
    pub fn close(&mut self, token: ViewToken) -> Option<ConversationView> {
        let view = self.views.remove(&token);
        if view.is_some() {
            tracing::debug!(%token, "closed view");
        }
        view
    }

    /// Route an event to the view with `token`.
    pub fn handle(&mut self, token: ViewToken, event: ViewEvent) -> Vec<ViewAction> {
        match self.views.get_mut(&token) {
            Some(view) => view.handle(event),
            None => {
                tracing::debug!(%token, "dropping event for closed view");
                vec![]
            },
        }
    }

    /// Deliver a timer tick to every open view.
    pub fn tick(&mut self, now: Instant) -> Vec<(ViewToken, ViewAction)> {
        let mut actions = Vec::new();
        for (&token, view) in &mut self.views {
            actions.extend(view.handle(ViewEvent::Tick { now }).into_iter().map(|a| (token, a)));
        }
        actions
    }

    /// Change the session's display name for every open and future view.
    pub fn set_author_name(&mut self, name: &str) {
        for view in self.views.values_mut() {
            view.set_author_name(name);
        }
        self.author_name = name.to_string();
    }

    /// Session display name.
    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    /// View with `token`, if open.
    pub fn view(&self, token: ViewToken) -> Option<&ConversationView> {
        self.views.get(&token)
    }

    /// Mutable view with `token`, if open.
    pub fn view_mut(&mut self, token: ViewToken) -> Option<&mut ConversationView> {
        self.views.get_mut(&token)
    }

    /// Number of open views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True if no view is open.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_proto::{Message, MessageId};

    use super::*;
    use crate::LoadTicket;

    fn message(id: &str) -> Message {
        Message {
            id: Some(MessageId::new(id)),
            scope: Scope::new("demo"),
            author: "joon".into(),
            body: id.into(),
            origin_hint: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap(),
            request_id: None,
        }
    }

    fn ticket(actions: &[ViewAction]) -> LoadTicket {
        actions
            .iter()
            .find_map(|a| match a {
                ViewAction::LoadHistory { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn late_load_for_closed_view_is_dropped() {
        let mut host = Conversations::new(ViewConfig::default());
        let (first, actions) = host.open(Scope::new("demo"));
        let stale = ticket(&actions);
        host.close(first);

        let (second, actions) = host.open(Scope::new("demo"));
        let fresh = ticket(&actions);

        let dropped = host.handle(first, ViewEvent::HistoryLoaded {
            ticket: stale,
            messages: vec![message("stale")],
        });
        assert!(dropped.is_empty());

        host.handle(second, ViewEvent::HistoryLoaded {
            ticket: fresh,
            messages: vec![message("fresh")],
        });
        let bodies: Vec<_> =
            host.view(second).unwrap().log().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["fresh"]);
    }

    #[test]
    fn tokens_are_never_reused() {
        let mut host = Conversations::new(ViewConfig::default());
        let (a, _) = host.open(Scope::new("demo"));
        host.close(a);
        let (b, _) = host.open(Scope::new("demo"));

        assert_ne!(a, b);
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn author_name_applies_to_open_and_future_views() {
        let mut host = Conversations::new(ViewConfig::default());
        assert_eq!(host.author_name(), "Anonymous");
        let (open, _) = host.open(Scope::new("demo"));

        host.set_author_name("mina");
        let (later, _) = host.open(Scope::new("other"));

        assert_eq!(host.view(open).unwrap().author_name(), "mina");
        assert_eq!(host.view(later).unwrap().author_name(), "mina");
    }
}
