//! Snapshot log of one orchestrated run
//!
//! The log is append-only and ordered by causality. Once a run reaches a
//! terminal state the log is frozen and further appends are dropped.

use crate::domain::deferred::Payload;
use crate::error::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed message texts that golden snapshots depend on
pub mod messages {
    pub const COMMIT: &str = "COMMIT";
    pub const DISPATCH: &str = "DISPATCH";
    pub const RESOLUTION: &str = "RESOLUTION";
    pub const DATA_MOCKS: &str = "DATA MOCKS";
    pub const ACTION_CALL: &str = "ACTION CALL";
    pub const ACTION_RESOLVED: &str = "ACTION RESOLVED";
    pub const ACTION_REJECTED: &str = "ACTION REJECTED";
    pub const ACTION_DID_NOT_RESOLVE: &str = "ACTION DID NOT RESOLVE";
}

/// Separator used by the text rendering between entries
pub const TEXT_ENTRY_SEPARATOR: &str = "---";

/// One observable event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Payload,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, payload: Payload) -> Self {
        Self {
            message: message.into(),
            payload,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<LogEntry>,
    frozen: bool,
}

/// Shared handle to a run's log
///
/// Clones append to the same sequence, which lets call snappers, the
/// resolution engine and the orchestrator record into one log.
#[derive(Debug, Clone, Default)]
pub struct Log {
    state: Arc<Mutex<LogState>>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unless the log is frozen; returns whether it was kept
    pub fn add(&self, message: impl Into<String>, payload: Payload) -> bool {
        let mut state = self.state.lock();
        if state.frozen {
            return false;
        }
        state.entries.push(LogEntry::new(message, payload));
        true
    }

    pub fn freeze(&self) {
        self.state.lock().frozen = true;
    }

    pub fn unfreeze(&self) {
        self.state.lock().frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.state.lock().frozen
    }

    /// Ordered copy of the entries recorded so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries())?)
    }

    pub fn render_text(&self) -> Result<String> {
        render_text(&self.entries())
    }
}

/// Render entries in the line-oriented golden format
///
/// Each entry is its message, the compact JSON payload on its own line when
/// present, then a `---` separator line.
pub fn render_text(entries: &[LogEntry]) -> Result<String> {
    let mut rendered = String::new();
    for entry in entries {
        rendered.push_str(&entry.message);
        rendered.push('\n');
        if let Some(payload) = &entry.payload {
            rendered.push_str(&serde_json::to_string(payload)?);
            rendered.push('\n');
        }
        rendered.push_str(TEXT_ENTRY_SEPARATOR);
        rendered.push('\n');
    }
    Ok(rendered)
}
