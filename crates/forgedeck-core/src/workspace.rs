//! Cache of the build's file tree and the one actively edited file.
//!
//! The listing is only as fresh as the last refresh; there is no live sync
//! while a build runs. Content fetches are ticketed: every open invalidates
//! the tickets of earlier opens, so a slow fetch that resolves after the
//! user has moved on is discarded instead of clobbering the newer buffer.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::event_bus::{BuildEvent, EventBus};
use crate::remote::{BuildService, ProjectId, RemoteError};

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("no build session is attached")]
    NoSession,

    #[error("no file is open for editing")]
    NoActiveFile,

    #[error("file content has not finished loading")]
    ContentNotLoaded,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Identifies one content fetch. Completing a ticket that a later open (or a
/// session change) has superseded is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    project: ProjectId,
    path: String,
}

impl FetchTicket {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }
}

struct ActiveFile {
    path: String,
    /// `None` until the content fetch resolves; edits are rejected while
    /// pending so an empty buffer never overwrites unseen content.
    content: Option<String>,
}

#[derive(Default)]
struct WorkspaceState {
    project: Option<ProjectId>,
    files: Vec<String>,
    active: Option<ActiveFile>,
    fetch_seq: u64,
}

/// File listing plus single-file edit buffer for the current session.
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct FileWorkspace {
    remote: Arc<dyn BuildService>,
    bus: Arc<EventBus>,
    state: Arc<Mutex<WorkspaceState>>,
}

impl FileWorkspace {
    pub fn new(remote: Arc<dyn BuildService>, bus: Arc<EventBus>) -> Self {
        Self {
            remote,
            bus,
            state: Arc::new(Mutex::new(WorkspaceState::default())),
        }
    }

    /// Bind the workspace to a session, dropping everything cached for the
    /// previous one and invalidating in-flight fetches.
    pub fn attach(&self, project: ProjectId) {
        let mut state = self.state.lock().unwrap();
        state.project = Some(project);
        state.files.clear();
        state.active = None;
        state.fetch_seq += 1;
    }

    /// Unbind and clear. In-flight fetches for the old session are discarded
    /// when they complete.
    pub fn detach(&self) {
        let mut state = self.state.lock().unwrap();
        state.project = None;
        state.files.clear();
        state.active = None;
        state.fetch_seq += 1;
    }

    /// Replace the known path set with the server's current listing.
    pub fn refresh_listing(&self) -> Result<Vec<String>, WorkspaceError> {
        let project = self.current_project()?;
        let files = self.remote.list_files(&project)?;
        {
            let mut state = self.state.lock().unwrap();
            if state.project.as_ref() != Some(&project) {
                log::debug!("discarding stale file listing for {project}");
                return Ok(files);
            }
            state.files = files.clone();
        }
        self.bus.emit(BuildEvent::FilesRefreshed {
            files: files.clone(),
        });
        Ok(files)
    }

    /// Open `path` for editing and fetch its content on a background thread.
    pub fn open(&self, path: &str) -> Result<(), WorkspaceError> {
        let ticket = self.begin_open(path)?;
        let workspace = self.clone();
        std::thread::spawn(move || {
            let content = workspace.remote.fetch_file(ticket.project(), ticket.path());
            workspace.finish_open(&ticket, content);
        });
        Ok(())
    }

    /// Mark `path` active with its content pending, superseding any earlier
    /// open. Unsaved edits to the previous buffer are discarded.
    ///
    /// Split from [`finish_open`](Self::finish_open) so interfaces that run
    /// their own IO can complete the fetch themselves; [`open`](Self::open)
    /// wires the two together over the blocking client.
    pub fn begin_open(&self, path: &str) -> Result<FetchTicket, WorkspaceError> {
        let ticket = {
            let mut state = self.state.lock().unwrap();
            let project = state.project.clone().ok_or(WorkspaceError::NoSession)?;
            state.fetch_seq += 1;
            state.active = Some(ActiveFile {
                path: path.to_string(),
                content: None,
            });
            FetchTicket {
                seq: state.fetch_seq,
                project,
                path: path.to_string(),
            }
        };
        self.bus.emit(BuildEvent::FileOpened {
            path: ticket.path.clone(),
        });
        Ok(ticket)
    }

    /// Deliver fetched content for `ticket`. Returns `true` if it was
    /// applied; a superseded ticket is discarded.
    pub fn finish_open(&self, ticket: &FetchTicket, content: String) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if state.fetch_seq != ticket.seq || state.project.as_ref() != Some(&ticket.project) {
                log::debug!("discarding stale content fetch for {}", ticket.path);
                return false;
            }
            match state.active.as_mut() {
                Some(active) if active.path == ticket.path => active.content = Some(content),
                _ => {
                    log::debug!("discarding content fetch for unopened {}", ticket.path);
                    return false;
                }
            }
        }
        self.bus.emit(BuildEvent::FileLoaded {
            path: ticket.path.clone(),
        });
        true
    }

    /// Replace the in-memory buffer for the active path. No auto-save.
    pub fn edit(&self, new_content: impl Into<String>) -> Result<(), WorkspaceError> {
        let mut state = self.state.lock().unwrap();
        let active = state.active.as_mut().ok_or(WorkspaceError::NoActiveFile)?;
        if active.content.is_none() {
            return Err(WorkspaceError::ContentNotLoaded);
        }
        active.content = Some(new_content.into());
        Ok(())
    }

    /// Write the current buffer back to the active path.
    pub fn save(&self) -> Result<(), WorkspaceError> {
        let (project, path, content) = {
            let state = self.state.lock().unwrap();
            let project = state.project.clone().ok_or(WorkspaceError::NoSession)?;
            let active = state.active.as_ref().ok_or(WorkspaceError::NoActiveFile)?;
            let content = active
                .content
                .clone()
                .ok_or(WorkspaceError::ContentNotLoaded)?;
            (project, active.path.clone(), content)
        };
        self.remote.write_file(&project, &path, &content)?;
        self.bus.emit(BuildEvent::FileSaved { path });
        Ok(())
    }

    /// Create (or overwrite) a file, refresh the listing, and open it.
    pub fn create(&self, path: &str, initial_content: &str) -> Result<(), WorkspaceError> {
        let project = self.current_project()?;
        self.remote.write_file(&project, path, initial_content)?;
        self.refresh_listing()?;
        self.open(path)
    }

    pub fn files(&self) -> Vec<String> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn active_path(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.active.as_ref().map(|a| a.path.clone())
    }

    /// Content of the active buffer; `None` while no file is open or the
    /// fetch is still pending.
    pub fn active_content(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.active.as_ref().and_then(|a| a.content.clone())
    }

    /// Whether a file is open with its content fetch still outstanding.
    pub fn is_loading(&self) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.active.as_ref(), Some(active) if active.content.is_none())
    }

    fn current_project(&self) -> Result<ProjectId, WorkspaceError> {
        self.state
            .lock()
            .unwrap()
            .project
            .clone()
            .ok_or(WorkspaceError::NoSession)
    }
}
