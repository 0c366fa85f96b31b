//! Conversation view state machine.
//!
//! This module defines [`ConversationView`], the state of one open
//! conversation, decoupled from I/O. It consumes [`crate::ViewEvent`]s and
//! user calls, and produces [`crate::ViewAction`] instructions for the
//! runtime to execute.
//!
//! # Responsibilities
//!
//! - Holds the ordered message log, the draft and the display name.
//! - Admits pushed messages of its own scope only.
//! - Guards submission and tracks the single in-flight emit.
//! - Tracks delivery of each submission until its echo arrives.
//!
//! # Invariants
//!
//! - The log never contains a message of another scope.
//! - A loaded history is sorted by `created_at`; pushed messages follow in
//!   arrival order.
//! - A message id appears at most once; a re-delivered id replaces the entry
//!   in place.
//! - Submissions are never appended optimistically; they enter the log only
//!   through their echo.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parley_client::{ConnectionError, LoadError};
use parley_proto::{
    MAX_AUTHOR_CHARS, Message, MessageId, RequestId, Scope, SendMessage, normalize_author,
};

use crate::{
    DeliveryTracker, LoadState, LoadTicket, LogEntry, OriginHeuristic, Rejection, ViewAction,
    ViewEvent,
};

/// State of one open conversation.
#[derive(Debug, Clone)]
pub struct ConversationView {
    /// Conversation this view is bound to. Fixed for the view's lifetime.
    scope: Scope,
    /// Messages in display order.
    log: Vec<Message>,
    /// Position of each identified message in `log`.
    index: HashMap<MessageId, usize>,
    /// Text being composed.
    draft: String,
    /// Display name used for the next submission.
    author_name: String,
    /// True between submission and the emit call returning.
    send_in_flight: bool,
    /// History load status.
    load_state: LoadState,
    /// Ticket of the most recent history request.
    load_ticket: LoadTicket,
    /// Pushes admitted while the history request was in flight.
    live_during_load: Vec<Message>,
    /// Local authorship heuristic.
    identity: OriginHeuristic,
    /// Submissions awaiting their echo.
    delivery: DeliveryTracker,
}

impl ConversationView {
    /// Open a view for `scope` and request its history.
    pub fn open(scope: Scope, author_name: &str, ack_timeout: Duration) -> (Self, Vec<ViewAction>) {
        let ticket = LoadTicket(0);
        let view = Self {
            scope: scope.clone(),
            log: Vec::new(),
            index: HashMap::new(),
            draft: String::new(),
            author_name: truncate_author(author_name),
            send_in_flight: false,
            load_state: LoadState::Loading,
            load_ticket: ticket,
            live_during_load: Vec::new(),
            identity: OriginHeuristic::new(),
            delivery: DeliveryTracker::new(ack_timeout),
        };
        (view, vec![ViewAction::LoadHistory { scope, ticket }, ViewAction::Render])
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ViewEvent) -> Vec<ViewAction> {
        match event {
            ViewEvent::HistoryLoaded { ticket, messages } => {
                if self.accept_ticket(ticket) {
                    self.apply_history(messages);
                    vec![ViewAction::Render]
                } else {
                    vec![]
                }
            },
            ViewEvent::HistoryFailed { ticket, error } => {
                if self.accept_ticket(ticket) {
                    tracing::warn!(
                        scope = %self.scope,
                        %error,
                        transient = error.is_transient(),
                        "history load failed"
                    );
                    self.load_state = LoadState::Failed(error);
                    self.live_during_load.clear();
                    vec![ViewAction::Render]
                } else {
                    vec![]
                }
            },
            ViewEvent::MessagePushed(message) => {
                if self.route(message) {
                    vec![ViewAction::Render]
                } else {
                    vec![]
                }
            },
            ViewEvent::SendDispatched { request_id, result } => {
                self.send_in_flight = false;
                if let Err(error) = result
                    && let Some(request_id) = request_id
                {
                    self.fail_send(request_id, &error);
                }
                vec![ViewAction::Render]
            },
            ViewEvent::Tick { now } => {
                let failed = self.delivery.expire(now);
                if failed.is_empty() {
                    return vec![];
                }
                for request_id in &failed {
                    tracing::warn!(scope = %self.scope, %request_id, "send was not echoed in time");
                }
                vec![ViewAction::Render]
            },
        }
    }

    /// Live message router: admit a pushed message if it belongs to this
    /// view's scope.
    ///
    /// Returns true if the message entered the log.
    pub fn route(&mut self, message: Message) -> bool {
        if message.scope != self.scope {
            tracing::trace!(scope = %self.scope, other = %message.scope, "discarding push for other scope");
            return false;
        }

        let acknowledged = self.delivery.acknowledge(&message);
        if let Some(request) = &acknowledged {
            tracing::debug!(scope = %self.scope, request_id = ?request.request_id, "send echoed");
        }
        self.identity.observe(&message, &self.author_name, acknowledged.is_some());

        if self.load_state == LoadState::Loading {
            self.live_during_load.push(message.clone());
        }
        self.insert(message);
        true
    }

    /// Replace the draft.
    pub fn set_draft(&mut self, draft: impl Into<String>) -> Vec<ViewAction> {
        self.draft = draft.into();
        vec![ViewAction::Render]
    }

    /// Change the display name, truncated to the maximum author length.
    ///
    /// The name is session state shared by every view, so the caller renders
    /// once after updating all of them.
    pub fn set_author_name(&mut self, name: &str) {
        self.author_name = truncate_author(name);
    }

    /// Check whether [`Self::submit`] would emit.
    pub fn can_submit(&self) -> Result<(), Rejection> {
        if self.send_in_flight {
            return Err(Rejection::SendInFlight);
        }
        if self.author_name.trim().is_empty() {
            return Err(Rejection::EmptyAuthor);
        }
        if self.draft.trim().is_empty() {
            return Err(Rejection::EmptyDraft);
        }
        Ok(())
    }

    /// Submit the draft.
    ///
    /// A rejected submission returns no actions and changes nothing. An
    /// accepted one clears the draft, marks a send in flight and asks the
    /// runtime to emit; the message itself arrives later through
    /// [`Self::route`].
    pub fn submit(&mut self, now: Instant) -> Vec<ViewAction> {
        if let Err(reason) = self.can_submit() {
            tracing::debug!(scope = %self.scope, ?reason, "submission ignored");
            return vec![];
        }

        let request = match SendMessage::new(
            self.scope.clone(),
            &self.author_name,
            &self.draft,
            Some(RequestId::new_v4()),
        ) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(
                    scope = %self.scope,
                    error = %e,
                    validation = e.is_validation(),
                    "submission ignored"
                );
                return vec![];
            },
        };

        self.send_in_flight = true;
        self.draft.clear();
        self.identity.arm();
        self.delivery.track(request.clone(), now);
        vec![ViewAction::Emit(request), ViewAction::Render]
    }

    /// Request the history again, replacing the log when it arrives.
    pub fn reload(&mut self) -> Vec<ViewAction> {
        self.load_ticket = LoadTicket(self.load_ticket.0 + 1);
        self.load_state = LoadState::Loading;
        self.live_during_load.clear();
        vec![
            ViewAction::LoadHistory { scope: self.scope.clone(), ticket: self.load_ticket },
            ViewAction::Render,
        ]
    }

    /// Resend a failed submission.
    pub fn retry_send(&mut self, request_id: RequestId, now: Instant) -> Vec<ViewAction> {
        if self.send_in_flight {
            return vec![];
        }
        match self.delivery.retry(request_id, now) {
            Some(request) => {
                self.send_in_flight = true;
                vec![ViewAction::Emit(request), ViewAction::Render]
            },
            None => vec![],
        }
    }

    /// The view's retry control: reload a failed history, otherwise resend the
    /// oldest failed submission.
    pub fn retry(&mut self, now: Instant) -> Vec<ViewAction> {
        if matches!(self.load_state, LoadState::Failed(_)) {
            return self.reload();
        }
        match self.delivery.oldest_failed() {
            Some(request_id) => self.retry_send(request_id, now),
            None => vec![],
        }
    }

    /// Forget failed submissions.
    pub fn dismiss_failed(&mut self) -> Vec<ViewAction> {
        if self.delivery.dismiss_failed() == 0 { vec![] } else { vec![ViewAction::Render] }
    }

    fn accept_ticket(&self, ticket: LoadTicket) -> bool {
        if ticket != self.load_ticket {
            tracing::debug!(scope = %self.scope, %ticket, current = %self.load_ticket, "ignoring superseded history load");
            return false;
        }
        self.load_state == LoadState::Loading
    }

    /// Replace the log with a loaded history, then re-apply pushes that
    /// arrived while the request was in flight.
    fn apply_history(&mut self, messages: Vec<Message>) {
        self.log.clear();
        self.index.clear();
        for message in messages {
            if message.scope == self.scope {
                self.insert(message);
            }
        }
        for message in std::mem::take(&mut self.live_during_load) {
            self.insert(message);
        }
        self.load_state = LoadState::Ready;
    }

    /// Append a message, or replace the entry with the same id.
    fn insert(&mut self, message: Message) {
        if let Some(id) = &message.id {
            if let Some(&position) = self.index.get(id) {
                tracing::debug!(scope = %self.scope, %id, "replacing re-delivered message");
                self.log[position] = message;
                return;
            }
            self.index.insert(id.clone(), self.log.len());
        }
        self.log.push(message);
    }

    fn fail_send(&mut self, request_id: RequestId, error: &ConnectionError) {
        tracing::warn!(scope = %self.scope, %request_id, %error, "send could not be emitted");
        self.delivery.fail(request_id);
    }

    /// Conversation this view is bound to.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Messages in display order.
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Messages with their authorship classification.
    pub fn entries(&self) -> impl Iterator<Item = LogEntry<'_>> {
        self.log.iter().map(|message| LogEntry { message, local: self.identity.is_local(message) })
    }

    /// Whether `message` is attributed to this client.
    pub fn is_local_author(&self, message: &Message) -> bool {
        self.identity.is_local(message)
    }

    /// Current draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Draft length in characters.
    pub fn draft_chars(&self) -> usize {
        self.draft.chars().count()
    }

    /// Display name for the next submission.
    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    /// True between submission and the emit call returning.
    pub fn send_in_flight(&self) -> bool {
        self.send_in_flight
    }

    /// History load status.
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// History load error, if the last load failed.
    pub fn load_error(&self) -> Option<&LoadError> {
        match &self.load_state {
            LoadState::Failed(error) => Some(error),
            LoadState::Loading | LoadState::Ready => None,
        }
    }

    /// Authorship heuristic state.
    pub fn identity(&self) -> &OriginHeuristic {
        &self.identity
    }

    /// Submission delivery state.
    pub fn delivery(&self) -> &DeliveryTracker {
        &self.delivery
    }
}

/// Cut a display name to at most [`MAX_AUTHOR_CHARS`] characters.
fn truncate_author(name: &str) -> String {
    match normalize_author(name) {
        Ok(_) => name.to_string(),
        Err(_) => name.chars().take(MAX_AUTHOR_CHARS).collect(),
    }
}
