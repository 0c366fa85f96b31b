//! Plain-text rendering.
//!
//! A render turns the active view into a [`Frame`]: the transcript (header
//! and log lines) plus notices about loading and delivery. [`Screen`]
//! remembers what was already printed so each render only writes what
//! changed. When an earlier line changes (a reload, or a re-delivered message
//! replacing its entry) the whole transcript is printed again.

use parley_app::{ConversationView, LoadState, LogEntry};
use parley_client::ConnectionStatus;

/// Text for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Header followed by one line per message.
    pub transcript: Vec<String>,
    /// Status lines below the transcript.
    pub notices: Vec<String>,
}

impl Frame {
    /// Build the frame for `view`, or the idle screen.
    pub fn of(view: Option<&ConversationView>, status: Option<ConnectionStatus>) -> Self {
        let Some(view) = view else {
            return Self {
                transcript: vec!["(no conversation open; /open <slug> to start)".to_string()],
                notices: vec![],
            };
        };

        let mut transcript = vec![format!("== {} == (as {})", view.scope(), view.author_name())];
        transcript.extend(view.entries().map(entry_line));

        let mut notices = Vec::new();
        match status {
            Some(ConnectionStatus::Connecting) => notices.push("connecting".to_string()),
            Some(ConnectionStatus::Reconnecting) => {
                notices.push("connection lost, reconnecting".to_string());
            },
            Some(ConnectionStatus::Connected(_)) | None => {},
        }
        match view.load_state() {
            LoadState::Loading => notices.push("loading history".to_string()),
            LoadState::Failed(error) => {
                notices.push(format!("history failed: {error} (/retry to reload)"));
            },
            LoadState::Ready if view.log().is_empty() => {
                notices.push("no messages yet".to_string());
            },
            LoadState::Ready => {},
        }

        let failed = view.delivery().failed_count();
        if failed > 0 {
            let noun = if failed == 1 { "message" } else { "messages" };
            notices.push(format!(
                "{failed} {noun} not delivered (/retry to resend, /dismiss to forget)"
            ));
        }
        if !view.draft().is_empty() {
            notices.push(format!("unsent draft ({} chars)", view.draft_chars()));
        }

        Self { transcript, notices }
    }
}

fn entry_line(entry: LogEntry<'_>) -> String {
    let message = entry.message;
    let time = message.created_at.format("%H:%M");
    let you = if entry.local { " (you)" } else { "" };
    format!("[{time}] {}{you}: {}", message.author, message.body)
}

/// Output state of a line-oriented terminal.
#[derive(Debug, Default)]
pub struct Screen {
    transcript: Vec<String>,
    notices: Vec<String>,
}

impl Screen {
    /// Create a blank screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print to bring the screen up to `frame`.
    pub fn update(&mut self, frame: Frame) -> Vec<String> {
        let mut out = Vec::new();

        if frame.transcript.starts_with(&self.transcript) {
            out.extend_from_slice(&frame.transcript[self.transcript.len()..]);
        } else {
            if !self.transcript.is_empty() {
                out.push(String::new());
            }
            out.extend_from_slice(&frame.transcript);
        }

        if frame.notices != self.notices {
            out.extend(frame.notices.iter().map(|notice| format!("! {notice}")));
        }

        self.transcript = frame.transcript;
        self.notices = frame.notices;
        out
    }
}
