//! Per-session lifecycle state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::remote::{BuildStatus, LogEntry, LogLevel, ProjectId};

/// Agent label used for log entries the controller fabricates locally
/// (build-started marker, create/start failures).
pub const LOCAL_AGENT: &str = "system";

/// Controller-side lifecycle phase.
///
/// While a session exists its phase mirrors the remote status; `Idle` is the
/// controller-only state of holding no session at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    Idle,
    Created,
    Building,
    Completed,
    Failed,
}

impl BuildPhase {
    /// Map a remote status onto the local phase. Unrecognized statuses keep
    /// the session in `Building`; the service only ever reports them while
    /// work is still in flight.
    pub fn from_status(status: &BuildStatus) -> Self {
        match status {
            BuildStatus::Created => BuildPhase::Created,
            BuildStatus::Building => BuildPhase::Building,
            BuildStatus::Completed => BuildPhase::Completed,
            BuildStatus::Failed => BuildPhase::Failed,
            BuildStatus::Other(_) => BuildPhase::Building,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildPhase::Completed | BuildPhase::Failed)
    }
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildPhase::Idle => write!(f, "idle"),
            BuildPhase::Created => write!(f, "created"),
            BuildPhase::Building => write!(f, "building"),
            BuildPhase::Completed => write!(f, "completed"),
            BuildPhase::Failed => write!(f, "failed"),
        }
    }
}

/// The one current build session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSession {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub phase: BuildPhase,
}

impl BuildSession {
    pub fn new(id: ProjectId, name: String, description: String) -> Self {
        Self {
            id,
            name,
            description,
            phase: BuildPhase::Created,
        }
    }
}

/// Fabricate a log entry locally, in the same shape the service emits, so
/// observers render it like any other line. The timestamp matches the
/// server's naive ISO format.
pub(crate) fn local_entry(level: LogLevel, message: impl Into<String>) -> LogEntry {
    LogEntry {
        timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        agent: LOCAL_AGENT.to_string(),
        level,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod build_phase {
        use super::*;

        #[test]
        fn mirrors_remote_status() {
            assert_eq!(
                BuildPhase::from_status(&BuildStatus::Created),
                BuildPhase::Created
            );
            assert_eq!(
                BuildPhase::from_status(&BuildStatus::Building),
                BuildPhase::Building
            );
            assert_eq!(
                BuildPhase::from_status(&BuildStatus::Completed),
                BuildPhase::Completed
            );
            assert_eq!(
                BuildPhase::from_status(&BuildStatus::Failed),
                BuildPhase::Failed
            );
        }

        #[test]
        fn unknown_status_stays_building() {
            let status = BuildStatus::Other("deploying".to_string());
            assert_eq!(BuildPhase::from_status(&status), BuildPhase::Building);
        }

        #[test]
        fn terminal_phases() {
            assert!(BuildPhase::Completed.is_terminal());
            assert!(BuildPhase::Failed.is_terminal());
            assert!(!BuildPhase::Idle.is_terminal());
            assert!(!BuildPhase::Created.is_terminal());
            assert!(!BuildPhase::Building.is_terminal());
        }

        #[test]
        fn serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&BuildPhase::Building).unwrap(),
                "\"building\""
            );
        }
    }

    mod build_session {
        use super::*;

        #[test]
        fn new_session_starts_created() {
            let session = BuildSession::new(
                ProjectId::from("p1"),
                "todo app".to_string(),
                "a todo app with auth".to_string(),
            );
            assert_eq!(session.phase, BuildPhase::Created);
            assert_eq!(session.id, ProjectId::from("p1"));
        }
    }

    mod local_entry {
        use super::*;

        #[test]
        fn carries_the_local_agent_label() {
            let entry = local_entry(LogLevel::Error, "Build start failed");
            assert_eq!(entry.agent, LOCAL_AGENT);
            assert_eq!(entry.level, LogLevel::Error);
            assert_eq!(entry.message, "Build start failed");
        }

        #[test]
        fn timestamp_looks_like_server_format() {
            let entry = local_entry(LogLevel::Info, "Build started");
            // Naive ISO-8601, no trailing offset designator.
            assert_eq!(&entry.timestamp[10..11], "T");
            assert!(!entry.timestamp.ends_with('Z'));
        }
    }
}
