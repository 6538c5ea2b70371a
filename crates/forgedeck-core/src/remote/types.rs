//! Wire types for the remote build service API.
//!
//! These structs mirror the JSON payloads the service returns. Fields the
//! controller does not consume are left undeclared; serde ignores unknown
//! keys, so payload growth on the server side is non-breaking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for a build project/session, assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a build session, as reported by the service.
///
/// The deployed service spells the first two states `initializing` and
/// `running`; both spellings decode to the canonical variant. Anything
/// unrecognized is carried through as [`BuildStatus::Other`] and treated as
/// non-terminal rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Created,
    Building,
    Completed,
    Failed,
    Other(String),
}

impl BuildStatus {
    /// `true` once the session will never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Completed | BuildStatus::Failed)
    }
}

impl From<String> for BuildStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" | "initializing" => BuildStatus::Created,
            "building" | "running" => BuildStatus::Building,
            "completed" => BuildStatus::Completed,
            "failed" | "error" => BuildStatus::Failed,
            _ => BuildStatus::Other(s),
        }
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Created => write!(f, "created"),
            BuildStatus::Building => write!(f, "building"),
            BuildStatus::Completed => write!(f, "completed"),
            BuildStatus::Failed => write!(f, "failed"),
            BuildStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Severity of a log entry. Free text on the wire; the well-known values
/// get variants so interfaces can style them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Info,
    Error,
    Success,
    Other(String),
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "info" => LogLevel::Info,
            "error" => LogLevel::Error,
            "success" => LogLevel::Success,
            _ => LogLevel::Other(s),
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One line of build output, produced by a named agent on the service side.
///
/// The timestamp is kept as the ISO-8601 text the server sent. The service
/// emits naive `isoformat()` strings (no offset), so re-parsing into an
/// offset-aware type would reject real payloads; ordering comes from the
/// server's returned sequence, not from this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub message: String,
}

/// Project summary returned from session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: BuildStatus,
}

/// Full project detail from the status endpoint.
///
/// The same payload embeds a path→content map of generated files; it is
/// deliberately not declared here so the status poll stays cheap. The file
/// listing has its own endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: BuildStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Service health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
    /// Number of agents the service has registered.
    #[serde(default)]
    pub agents: u64,
}

/// Status of a single service-side agent role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub status: String,
    pub role: String,
}

/// Per-role agent status map from the roster endpoint.
pub type AgentRoster = HashMap<String, AgentStatus>;

#[cfg(test)]
mod tests {
    use super::*;

    mod project_id {
        use super::*;

        #[test]
        fn display_shows_inner_string() {
            let id = ProjectId("proj-123".to_string());
            assert_eq!(format!("{}", id), "proj-123");
        }

        #[test]
        fn serializes_as_plain_string() {
            let id = ProjectId("abc".to_string());
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        }

        #[test]
        fn can_be_used_as_hashmap_key() {
            let mut map = HashMap::new();
            map.insert(ProjectId::from("p1"), 1);
            assert_eq!(map.get(&ProjectId::from("p1")), Some(&1));
        }
    }

    mod build_status {
        use super::*;

        #[test]
        fn canonical_spellings_decode() {
            assert_eq!(BuildStatus::from("created".to_string()), BuildStatus::Created);
            assert_eq!(BuildStatus::from("building".to_string()), BuildStatus::Building);
            assert_eq!(BuildStatus::from("completed".to_string()), BuildStatus::Completed);
            assert_eq!(BuildStatus::from("failed".to_string()), BuildStatus::Failed);
        }

        #[test]
        fn service_spellings_decode_to_canonical() {
            assert_eq!(
                BuildStatus::from("initializing".to_string()),
                BuildStatus::Created
            );
            assert_eq!(BuildStatus::from("running".to_string()), BuildStatus::Building);
        }

        #[test]
        fn unknown_status_is_carried_through() {
            let status = BuildStatus::from("paused".to_string());
            assert_eq!(status, BuildStatus::Other("paused".to_string()));
            assert!(!status.is_terminal());
        }

        #[test]
        fn only_completed_and_failed_are_terminal() {
            assert!(!BuildStatus::Created.is_terminal());
            assert!(!BuildStatus::Building.is_terminal());
            assert!(BuildStatus::Completed.is_terminal());
            assert!(BuildStatus::Failed.is_terminal());
        }

        #[test]
        fn deserializes_from_json_string() {
            let status: BuildStatus = serde_json::from_str("\"running\"").unwrap();
            assert_eq!(status, BuildStatus::Building);
        }

        #[test]
        fn serializes_to_canonical_spelling() {
            let json = serde_json::to_string(&BuildStatus::Building).unwrap();
            assert_eq!(json, "\"building\"");
        }
    }

    mod log_entry {
        use super::*;

        #[test]
        fn decodes_service_payload() {
            let json = r#"{
                "timestamp": "2026-01-15T10:30:00.123456",
                "agent": "BackendEngineer",
                "level": "success",
                "message": "Completed: implemented API"
            }"#;
            let entry: LogEntry = serde_json::from_str(json).unwrap();
            assert_eq!(entry.agent, "BackendEngineer");
            assert_eq!(entry.level, LogLevel::Success);
            assert_eq!(entry.timestamp, "2026-01-15T10:30:00.123456");
        }

        #[test]
        fn missing_fields_default() {
            let entry: LogEntry = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
            assert_eq!(entry.level, LogLevel::Info);
            assert!(entry.agent.is_empty());
            assert!(entry.timestamp.is_empty());
        }

        #[test]
        fn free_text_level_is_preserved() {
            let entry: LogEntry =
                serde_json::from_str(r#"{"message": "m", "level": "warning"}"#).unwrap();
            assert_eq!(entry.level, LogLevel::Other("warning".to_string()));
        }
    }

    mod project_payloads {
        use super::*;

        #[test]
        fn project_info_decodes_creation_payload() {
            let json = r#"{
                "id": "a1b2c3",
                "name": "todo app",
                "description": "a todo app with auth",
                "status": "initializing"
            }"#;
            let info: ProjectInfo = serde_json::from_str(json).unwrap();
            assert_eq!(info.id, ProjectId::from("a1b2c3"));
            assert_eq!(info.status, BuildStatus::Created);
        }

        #[test]
        fn project_detail_ignores_embedded_files_map() {
            let json = r#"{
                "id": "a1b2c3",
                "name": "todo app",
                "description": "a todo app",
                "status": "running",
                "created_at": "2026-01-15T10:00:00",
                "files": {"/src/app.js": "content"}
            }"#;
            let detail: ProjectDetail = serde_json::from_str(json).unwrap();
            assert_eq!(detail.status, BuildStatus::Building);
            assert_eq!(detail.created_at.as_deref(), Some("2026-01-15T10:00:00"));
        }
    }
}
