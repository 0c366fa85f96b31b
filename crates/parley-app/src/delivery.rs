//! Send acknowledgment tracking.
//!
//! The live channel has no explicit ack, so a send counts as delivered when
//! its echo comes back through the router. Each submission is tracked until
//! then; a submission still unechoed at its deadline becomes
//! [`DeliveryState::Failed`] and can be retried or dismissed.
//!
//! Echoes are matched by request id. Servers that drop the id are matched on
//! scope, author and body instead, oldest submission first.

use std::time::{Duration, Instant};

use parley_proto::{Message, RequestId, SendMessage};

/// Delivery status of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Emitted; waiting for the echo.
    Pending {
        /// When the submission fails if no echo arrived.
        deadline: Instant,
    },
    /// No echo before the deadline, or the emit itself failed.
    Failed,
}

/// A submission awaiting its echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    /// Request as emitted.
    pub request: SendMessage,
    /// Current status.
    pub state: DeliveryState,
    /// Number of times the request was emitted.
    pub attempts: u32,
}

impl PendingSend {
    fn request_id(&self) -> Option<RequestId> {
        self.request.request_id
    }

    fn matches_echo(&self, message: &Message) -> bool {
        match message.request_id {
            Some(id) => self.request_id() == Some(id),
            None => {
                self.request.scope == message.scope
                    && self.request.author == message.author
                    && self.request.body == message.body
            },
        }
    }
}

/// Submissions of one view, in submission order.
#[derive(Debug, Clone)]
pub struct DeliveryTracker {
    timeout: Duration,
    sends: Vec<PendingSend>,
}

impl DeliveryTracker {
    /// Create a tracker that fails sends after `timeout` without an echo.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, sends: Vec::new() }
    }

    /// Start tracking an emitted request.
    pub fn track(&mut self, request: SendMessage, now: Instant) {
        let deadline = now + self.timeout;
        self.sends.push(PendingSend {
            request,
            state: DeliveryState::Pending { deadline },
            attempts: 1,
        });
    }

    /// Settle the submission `message` echoes, if any.
    ///
    /// A late echo also settles a submission already marked failed.
    pub fn acknowledge(&mut self, message: &Message) -> Option<SendMessage> {
        let index = self.sends.iter().position(|send| send.matches_echo(message))?;
        Some(self.sends.remove(index).request)
    }

    /// Mark every submission past its deadline as failed.
    ///
    /// Returns the requests that failed during this call.
    pub fn expire(&mut self, now: Instant) -> Vec<RequestId> {
        let mut failed = Vec::new();
        for send in &mut self.sends {
            if let DeliveryState::Pending { deadline } = send.state
                && now >= deadline
            {
                send.state = DeliveryState::Failed;
                failed.extend(send.request_id());
            }
        }
        failed
    }

    /// Mark a submission as failed immediately.
    pub fn fail(&mut self, request_id: RequestId) {
        if let Some(send) = self.find_mut(request_id) {
            send.state = DeliveryState::Failed;
        }
    }

    /// Re-arm a failed submission and return the request to emit again.
    ///
    /// Pending submissions are not retried.
    pub fn retry(&mut self, request_id: RequestId, now: Instant) -> Option<SendMessage> {
        let deadline = now + self.timeout;
        let send = self.find_mut(request_id)?;
        if send.state != DeliveryState::Failed {
            return None;
        }
        send.state = DeliveryState::Pending { deadline };
        send.attempts += 1;
        Some(send.request.clone())
    }

    /// Forget every failed submission. Returns how many were removed.
    pub fn dismiss_failed(&mut self) -> usize {
        let before = self.sends.len();
        self.sends.retain(|send| send.state != DeliveryState::Failed);
        before - self.sends.len()
    }

    /// Oldest failed submission.
    pub fn oldest_failed(&self) -> Option<RequestId> {
        self.sends
            .iter()
            .find(|send| send.state == DeliveryState::Failed)
            .and_then(PendingSend::request_id)
    }

    /// All tracked submissions in submission order.
    pub fn sends(&self) -> &[PendingSend] {
        &self.sends
    }

    /// Number of failed submissions.
    pub fn failed_count(&self) -> usize {
        self.sends.iter().filter(|send| send.state == DeliveryState::Failed).count()
    }

    fn find_mut(&mut self, request_id: RequestId) -> Option<&mut PendingSend> {
        self.sends.iter_mut().find(|send| send.request_id() == Some(request_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_proto::Scope;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn request(body: &str) -> SendMessage {
        SendMessage::new(Scope::new("demo"), "mina", body, Some(RequestId::new_v4())).unwrap()
    }

    fn echo(request: &SendMessage, with_id: bool) -> Message {
        Message {
            id: None,
            scope: request.scope.clone(),
            author: request.author.clone(),
            body: request.body.clone(),
            origin_hint: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap(),
            request_id: if with_id { request.request_id } else { None },
        }
    }

    #[test]
    fn echo_with_request_id_settles() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let sent = request("hi");
        tracker.track(sent.clone(), Instant::now());

        assert_eq!(tracker.acknowledge(&echo(&sent, true)), Some(sent));
        assert!(tracker.sends().is_empty());
    }

    #[test]
    fn echo_without_request_id_matches_content() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let first = request("same");
        let second = request("same");
        tracker.track(first.clone(), Instant::now());
        tracker.track(second.clone(), Instant::now());

        // Oldest submission is settled first
        assert_eq!(tracker.acknowledge(&echo(&second, false)), Some(first));
        assert_eq!(tracker.sends().len(), 1);
    }

    #[test]
    fn foreign_message_settles_nothing() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let sent = request("hi");
        tracker.track(sent.clone(), Instant::now());

        let mut other = echo(&sent, false);
        other.author = "joon".into();
        assert_eq!(tracker.acknowledge(&other), None);
    }

    #[test]
    fn expires_at_deadline() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let start = Instant::now();
        let sent = request("hi");
        tracker.track(sent.clone(), start);

        assert!(tracker.expire(start + TIMEOUT - Duration::from_millis(1)).is_empty());
        assert_eq!(tracker.expire(start + TIMEOUT), vec![sent.request_id.unwrap()]);
        // Already failed; not reported twice
        assert!(tracker.expire(start + TIMEOUT * 2).is_empty());
    }

    #[test]
    fn retry_rearms_failed_send() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let start = Instant::now();
        let sent = request("hi");
        let id = sent.request_id.unwrap();
        tracker.track(sent.clone(), start);

        assert_eq!(tracker.retry(id, start), None, "pending sends are not retried");

        tracker.expire(start + TIMEOUT);
        let later = start + TIMEOUT * 2;
        assert_eq!(tracker.retry(id, later), Some(sent));
        assert_eq!(tracker.sends()[0].attempts, 2);
        assert_eq!(tracker.sends()[0].state, DeliveryState::Pending { deadline: later + TIMEOUT });
    }

    #[test]
    fn late_echo_settles_failed_send() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let start = Instant::now();
        let sent = request("hi");
        tracker.track(sent.clone(), start);
        tracker.expire(start + TIMEOUT);

        assert!(tracker.acknowledge(&echo(&sent, true)).is_some());
        assert_eq!(tracker.failed_count(), 0);
    }

    #[test]
    fn dismiss_removes_only_failed() {
        let mut tracker = DeliveryTracker::new(TIMEOUT);
        let start = Instant::now();
        tracker.track(request("old"), start);
        tracker.expire(start + TIMEOUT);
        tracker.track(request("new"), start + TIMEOUT);

        assert_eq!(tracker.dismiss_failed(), 1);
        assert_eq!(tracker.sends().len(), 1);
        assert_eq!(tracker.sends()[0].request.body, "new");
    }
}
