//! Blocking HTTP implementation of [`BuildService`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{
    AgentRoster, BuildStatus, HealthInfo, LogEntry, ProjectDetail, ProjectId, ProjectInfo,
};
use super::{path_for_store, path_for_url, BuildService, RemoteError, FILE_FETCH_ERROR_TEXT};

/// Per-request timeout. Polls run every two seconds, so anything slower than
/// this is better treated as a missed tick than waited on.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the build service.
pub struct HttpBuildService {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBuildService {
    /// Create a client for the service at `base_url` (trailing `/` trimmed).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { agent, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| request_error(url, e))?;
        response.into_json::<T>().map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let response = self
            .agent
            .post(url)
            .send_json(body)
            .map_err(|e| request_error(url, e))?;
        response.into_json::<T>().map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

impl BuildService for HttpBuildService {
    fn create_project(&self, name: &str, description: &str) -> Result<ProjectInfo, RemoteError> {
        let url = format!("{}/api/projects", self.base_url);
        let body = serde_json::json!({ "name": name, "description": description });
        let reply: CreateProjectResponse = self.post_json(&url, body)?;
        match reply {
            CreateProjectResponse {
                success: true,
                project: Some(project),
            } => Ok(project),
            _ => Err(RemoteError::CreateFailed),
        }
    }

    fn start_build(&self, id: &ProjectId) -> Result<(), RemoteError> {
        let url = format!("{}/api/projects/{}/build", self.base_url, id);
        let response = self
            .agent
            .post(&url)
            .call()
            .map_err(|e| request_error(&url, e))?;
        let ack: AckResponse = response.into_json().map_err(|e| RemoteError::Decode {
            url: url.clone(),
            source: e,
        })?;
        if ack.success {
            Ok(())
        } else {
            Err(RemoteError::StartFailed)
        }
    }

    fn fetch_status(&self, id: &ProjectId) -> Result<BuildStatus, RemoteError> {
        self.fetch_project(id).map(|detail| detail.status)
    }

    fn fetch_project(&self, id: &ProjectId) -> Result<ProjectDetail, RemoteError> {
        let url = format!("{}/api/projects/{}", self.base_url, id);
        self.get_json(&url)
    }

    fn fetch_logs(&self, id: &ProjectId) -> Result<Vec<LogEntry>, RemoteError> {
        let url = format!("{}/api/projects/{}/logs", self.base_url, id);
        let reply: LogsResponse = self.get_json(&url)?;
        Ok(reply.logs)
    }

    fn list_files(&self, id: &ProjectId) -> Result<Vec<String>, RemoteError> {
        let url = format!("{}/api/projects/{}/files", self.base_url, id);
        let reply: FilesResponse = self.get_json(&url)?;
        Ok(reply.files)
    }

    fn fetch_file(&self, id: &ProjectId, path: &str) -> String {
        let url = format!(
            "{}/api/projects/{}/files/{}",
            self.base_url,
            id,
            path_for_url(path)
        );
        match self.get_json::<FileContentResponse>(&url) {
            Ok(reply) => reply.content,
            Err(e) => {
                log::warn!("file fetch failed for {path}: {e}");
                FILE_FETCH_ERROR_TEXT.to_string()
            }
        }
    }

    fn write_file(&self, id: &ProjectId, path: &str, content: &str) -> Result<(), RemoteError> {
        let url = format!("{}/api/projects/{}/files", self.base_url, id);
        let body = serde_json::json!({
            "path": path_for_store(path),
            "content": content,
        });
        let ack: AckResponse = self.post_json(&url, body)?;
        if ack.success {
            Ok(())
        } else {
            Err(RemoteError::WriteFailed)
        }
    }

    fn health(&self) -> Result<HealthInfo, RemoteError> {
        let url = format!("{}/health", self.base_url);
        self.get_json(&url)
    }

    fn agent_statuses(&self) -> Result<AgentRoster, RemoteError> {
        let url = format!("{}/api/agents/status", self.base_url);
        let reply: RosterResponse = self.get_json(&url)?;
        Ok(reply.agents)
    }
}

fn request_error(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(code, _) => RemoteError::Status {
            url: url.to_string(),
            code,
        },
        other => RemoteError::Transport {
            url: url.to_string(),
            source: Box::new(other),
        },
    }
}

// Response envelopes. Transport detail only; the trait surface exposes the
// decoded domain types.

#[derive(Debug, Deserialize)]
struct CreateProjectResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    project: Option<ProjectInfo>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileContentResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    agents: AgentRoster,
}
