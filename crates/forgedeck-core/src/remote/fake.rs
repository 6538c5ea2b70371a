//! Scripted [`BuildService`] double for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use super::types::{
    AgentRoster, BuildStatus, HealthInfo, LogEntry, LogLevel, ProjectDetail, ProjectId,
    ProjectInfo,
};
use super::{BuildService, RemoteError, FILE_FETCH_ERROR_TEXT};

/// One recorded call against the fake, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteCall {
    CreateProject { name: String, description: String },
    StartBuild(ProjectId),
    FetchStatus(ProjectId),
    FetchLogs(ProjectId),
    ListFiles(ProjectId),
    FetchFile { id: ProjectId, path: String },
    WriteFile { id: ProjectId, path: String, content: String },
}

/// In-memory build service with scripted poll responses.
///
/// Status and log responses are queues consumed one per fetch; when a queue
/// runs dry the fake keeps answering with a quiet `building` state so a
/// still-running poll loop doesn't panic the test.
#[derive(Default)]
pub(crate) struct FakeBuildService {
    calls: Mutex<Vec<RemoteCall>>,
    next_id: AtomicU64,
    statuses: Mutex<VecDeque<BuildStatus>>,
    logs: Mutex<VecDeque<Vec<LogEntry>>>,
    files: Mutex<Vec<String>>,
    contents: Mutex<HashMap<String, String>>,
    fail_create: AtomicBool,
    fail_start: AtomicBool,
    fail_write: AtomicBool,
    fail_logs: AtomicBool,
    fail_status: AtomicBool,
}

impl FakeBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: BuildStatus) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn push_logs(&self, entries: Vec<LogEntry>) {
        self.logs.lock().unwrap().push_back(entries);
    }

    pub fn set_files(&self, files: Vec<&str>) {
        *self.files.lock().unwrap() = files.into_iter().map(String::from).collect();
    }

    pub fn set_content(&self, path: &str, content: &str) {
        self.contents
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_write(&self) {
        self.fail_write.store(true, Ordering::SeqCst);
    }

    pub fn fail_logs(&self) {
        self.fail_logs.store(true, Ordering::SeqCst);
    }

    pub fn fail_status(&self) {
        self.fail_status.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&RemoteCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_error() -> RemoteError {
        RemoteError::Status {
            url: "fake://build-service".to_string(),
            code: 500,
        }
    }
}

/// A minimal server-shaped log entry for scripting poll responses.
pub(crate) fn server_log(agent: &str, message: &str) -> LogEntry {
    LogEntry {
        timestamp: "2026-01-15T10:30:00.000000".to_string(),
        agent: agent.to_string(),
        level: LogLevel::Info,
        message: message.to_string(),
    }
}

impl BuildService for FakeBuildService {
    fn create_project(&self, name: &str, description: &str) -> Result<ProjectInfo, RemoteError> {
        self.record(RemoteCall::CreateProject {
            name: name.to_string(),
            description: description.to_string(),
        });
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::scripted_error());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProjectInfo {
            id: ProjectId(format!("proj-{n}")),
            name: name.to_string(),
            description: description.to_string(),
            status: BuildStatus::Created,
        })
    }

    fn start_build(&self, id: &ProjectId) -> Result<(), RemoteError> {
        self.record(RemoteCall::StartBuild(id.clone()));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Self::scripted_error());
        }
        Ok(())
    }

    fn fetch_status(&self, id: &ProjectId) -> Result<BuildStatus, RemoteError> {
        self.record(RemoteCall::FetchStatus(id.clone()));
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::scripted_error());
        }
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BuildStatus::Building))
    }

    fn fetch_project(&self, id: &ProjectId) -> Result<ProjectDetail, RemoteError> {
        let status = self.fetch_status(id)?;
        Ok(ProjectDetail {
            id: id.clone(),
            name: "scripted".to_string(),
            description: String::new(),
            status,
            created_at: None,
        })
    }

    fn fetch_logs(&self, id: &ProjectId) -> Result<Vec<LogEntry>, RemoteError> {
        self.record(RemoteCall::FetchLogs(id.clone()));
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(Self::scripted_error());
        }
        Ok(self.logs.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn list_files(&self, id: &ProjectId) -> Result<Vec<String>, RemoteError> {
        self.record(RemoteCall::ListFiles(id.clone()));
        Ok(self.files.lock().unwrap().clone())
    }

    fn fetch_file(&self, id: &ProjectId, path: &str) -> String {
        self.record(RemoteCall::FetchFile {
            id: id.clone(),
            path: path.to_string(),
        });
        self.contents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| FILE_FETCH_ERROR_TEXT.to_string())
    }

    fn write_file(&self, id: &ProjectId, path: &str, content: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::WriteFile {
            id: id.clone(),
            path: path.to_string(),
            content: content.to_string(),
        });
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(RemoteError::WriteFailed);
        }
        self.contents
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn health(&self) -> Result<HealthInfo, RemoteError> {
        Ok(HealthInfo {
            status: "healthy".to_string(),
            timestamp: "2026-01-15T10:00:00".to_string(),
            agents: 12,
        })
    }

    fn agent_statuses(&self) -> Result<AgentRoster, RemoteError> {
        Ok(AgentRoster::new())
    }
}
