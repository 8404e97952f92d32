//! Notification hooks the tools call around each operation.
//!
//! The core never logs on its own; whoever builds a tool decides what a
//! notification turns into by injecting an observer.

use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::tool::{ErrorKind, ToolError};

/// Receives notifications about tool calls.
pub trait ToolObserver: Send + Sync {
    /// Called once the argument record has been parsed, before the operation runs.
    fn on_start(&self, _tool: &str, _detail: &str) {}

    /// Called when the operation succeeded.
    fn on_success(&self, _tool: &str, _summary: &str) {}

    /// Called when the operation failed and the failure was recovered into tool output.
    fn on_failure(&self, _tool: &str, _error: &ToolError) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ToolObserver for NoopObserver {}

/// Observer that forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ToolObserver for TracingObserver {
    fn on_start(&self, tool: &str, detail: &str) {
        info!(tool, "{detail}");
    }

    fn on_success(&self, tool: &str, summary: &str) {
        info!(tool, "{summary}");
    }

    fn on_failure(&self, tool: &str, error: &ToolError) {
        match error.kind() {
            // Expected outcomes an agent reacts to, not faults.
            ErrorKind::NoMatch | ErrorKind::AmbiguousTarget | ErrorKind::CommandNonzeroExit => {
                warn!(tool, kind = ?error.kind(), "{error}");
            }
            _ => error!(tool, kind = ?error.kind(), "{error}"),
        }
    }
}

/// A single notification captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// An operation started.
    Started {
        /// Tool name.
        tool: String,
        /// Description of the call.
        detail: String,
    },
    /// An operation succeeded.
    Succeeded {
        /// Tool name.
        tool: String,
        /// Description of the result.
        summary: String,
    },
    /// An operation failed.
    Failed {
        /// Tool name.
        tool: String,
        /// Classification of the failure.
        kind: ErrorKind,
        /// Rendered error message.
        message: String,
    },
}

/// Observer that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: ObserverEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ToolObserver for RecordingObserver {
    fn on_start(&self, tool: &str, detail: &str) {
        self.record(ObserverEvent::Started {
            tool: tool.to_owned(),
            detail: detail.to_owned(),
        });
    }

    fn on_success(&self, tool: &str, summary: &str) {
        self.record(ObserverEvent::Succeeded {
            tool: tool.to_owned(),
            summary: summary.to_owned(),
        });
    }

    fn on_failure(&self, tool: &str, error: &ToolError) {
        self.record(ObserverEvent::Failed {
            tool: tool.to_owned(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}
