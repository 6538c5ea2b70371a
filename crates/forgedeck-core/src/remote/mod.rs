//! Client for the remote build service.
//!
//! [`BuildService`] is the seam between the controller and the wire: the
//! production implementation ([`HttpBuildService`]) speaks blocking HTTP,
//! and tests script a fake against the same trait. Implementations are
//! stateless request/response wrappers; they never retry and never cache.
//! Retry policy belongs to the poll loop, caching to the workspace.

mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpBuildService;
pub use types::{
    AgentRoster, AgentStatus, BuildStatus, HealthInfo, LogEntry, LogLevel, ProjectDetail,
    ProjectId, ProjectInfo,
};

use thiserror::Error;

/// Content returned by [`BuildService::fetch_file`] when the fetch fails.
///
/// File-content fetches fail softly: the observer sees this marker in the
/// editor instead of the operation erroring out, and the next open retries.
pub const FILE_FETCH_ERROR_TEXT: &str = "// Error loading file content";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{url} returned HTTP {code}")]
    Status { url: String, code: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("project creation rejected by server")]
    CreateFailed,

    #[error("build start rejected by server")]
    StartFailed,

    #[error("file write rejected by server")]
    WriteFailed,
}

/// Operations the remote build service exposes.
///
/// All calls are one-shot request/response; there is no streaming transport.
pub trait BuildService: Send + Sync {
    /// Create a new build session. The service assigns the id.
    fn create_project(&self, name: &str, description: &str) -> Result<ProjectInfo, RemoteError>;

    /// Kick off the autonomous build for an existing session.
    fn start_build(&self, id: &ProjectId) -> Result<(), RemoteError>;

    /// Current lifecycle status, independent of log content.
    fn fetch_status(&self, id: &ProjectId) -> Result<BuildStatus, RemoteError>;

    /// Full project detail (name, description, status, creation time).
    fn fetch_project(&self, id: &ProjectId) -> Result<ProjectDetail, RemoteError>;

    /// The full log history to date, oldest first. Empty is a valid result.
    fn fetch_logs(&self, id: &ProjectId) -> Result<Vec<LogEntry>, RemoteError>;

    /// Paths of all files the build has produced. Empty is a valid result.
    fn list_files(&self, id: &ProjectId) -> Result<Vec<String>, RemoteError>;

    /// Content of one file. Soft-fails with [`FILE_FETCH_ERROR_TEXT`] on any
    /// transport or decode failure.
    fn fetch_file(&self, id: &ProjectId, path: &str) -> String;

    /// Create a new file or overwrite an existing one.
    fn write_file(&self, id: &ProjectId, path: &str, content: &str) -> Result<(), RemoteError>;

    /// Service liveness and agent count.
    fn health(&self) -> Result<HealthInfo, RemoteError>;

    /// Per-role status of the service's agents.
    fn agent_statuses(&self) -> Result<AgentRoster, RemoteError>;
}

/// Strip the leading `/` for path segments interpolated into GET URLs.
/// The server's file-fetch route captures the remainder of the URL and
/// re-roots it itself.
pub(crate) fn path_for_url(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Ensure the leading `/` for paths sent in write bodies. The server stores
/// paths slash-rooted, and a bare relative path would create a second,
/// unreachable entry.
pub(crate) fn path_for_store(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
