//! Stream session state machine
//!
//! `idle -> active -> {result | error}`. Progress replaces progress; the
//! first terminal event wins and everything after it is ignored.

use serde::Serialize;
use serde_json::{Map, Value};

use super::events::{ProgressEvent, StreamEvent};

/// Observable snapshot of one streamed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamState {
    pub active: bool,
    pub last_progress: Option<ProgressEvent>,
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    /// Transport reported end of stream
    pub closed: bool,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    /// Nothing further will change without a new start/reset
    pub fn is_settled(&self) -> bool {
        !self.active || self.closed
    }

    /// Closed by the server with no result or error
    pub fn closed_without_outcome(&self) -> bool {
        self.active && self.closed && !self.is_terminal()
    }
}

/// What applying an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Progress,
    Terminal,
    /// Session inactive or already terminal
    Ignored,
}

/// Owned session state; the consumer mutates it only through these methods
#[derive(Debug, Default)]
pub struct StreamSession {
    state: StreamState,
}

impl StreamSession {
    /// Cleared, inactive session
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh active session with no progress yet
    pub fn begin() -> Self {
        Self {
            state: StreamState {
                active: true,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    fn accepts_events(&self) -> bool {
        self.state.active && !self.state.is_terminal()
    }

    pub fn apply(&mut self, event: StreamEvent) -> Applied {
        if !self.accepts_events() {
            return Applied::Ignored;
        }
        match event {
            StreamEvent::Progress(progress) => {
                self.state.last_progress = Some(progress);
                Applied::Progress
            }
            StreamEvent::Complete(result) => {
                self.state.result = Some(result);
                self.state.active = false;
                Applied::Terminal
            }
            StreamEvent::Error(message) => {
                self.finish_with_error(message);
                Applied::Terminal
            }
        }
    }

    /// End the session in error (connect failure, bad status, malformed event)
    pub fn fail(&mut self, message: impl Into<String>) -> Applied {
        if !self.accepts_events() {
            return Applied::Ignored;
        }
        self.finish_with_error(message.into());
        Applied::Terminal
    }

    fn finish_with_error(&mut self, message: String) {
        self.state.error = Some(message);
        self.state.active = false;
    }

    /// Transport ended; an active session without an outcome stays active
    pub fn mark_closed(&mut self) {
        self.state.closed = true;
    }
}
