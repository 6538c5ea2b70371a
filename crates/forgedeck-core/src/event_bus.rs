//! Framework-agnostic event broadcasting.
//!
//! Every observable change the controller makes is published as a
//! [`BuildEvent`] so presentation layers (CLI today, GUI shells tomorrow)
//! can render state without reaching into the core's internals. Events are
//! `Serialize`, so an interface may forward them over IPC verbatim.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::remote::{BuildStatus, LogEntry, ProjectInfo};
use crate::session::BuildPhase;

/// Default channel capacity. Subscribers slower than this many events behind
/// the emitter miss events (broadcast lag) rather than blocking the core.
const DEFAULT_CAPACITY: usize = 1024;

/// An observable change in the controller's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildEvent {
    /// A session was created on the service; the build has not started yet.
    SessionCreated { project: ProjectInfo },

    /// The lifecycle phase changed (including the fall back to idle after a
    /// failed create/start).
    PhaseChanged { phase: BuildPhase },

    /// A locally fabricated log entry was appended.
    LogAppended { entry: LogEntry },

    /// A poll replaced the log view with the server's full history-to-date.
    LogsReplaced { entries: Vec<LogEntry> },

    /// The session reached a terminal status; polling has stopped.
    BuildFinished { status: BuildStatus },

    /// The workspace file listing was replaced.
    FilesRefreshed { files: Vec<String> },

    /// A file was opened for editing; its content fetch is pending.
    FileOpened { path: String },

    /// The opened file's content arrived.
    FileLoaded { path: String },

    /// The active buffer was written back to the service.
    FileSaved { path: String },
}

/// Broadcast bus distributing [`BuildEvent`]s to any number of observers.
pub struct EventBus {
    sender: broadcast::Sender<BuildEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Returns how many received it; with
    /// no subscribers the event is dropped and 0 returned.
    pub fn emit(&self, event: BuildEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events. Past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<BuildEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
