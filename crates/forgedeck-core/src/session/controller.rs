//! The build-session lifecycle controller.
//!
//! Owns the one current session, its log view, the poll timer, and the
//! workspace binding. Every network result is applied under an epoch guard:
//! superseding or tearing down a session bumps the epoch, so in-flight
//! results for the old session are discarded instead of mutating state that
//! no longer belongs to them.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::state::{local_entry, BuildPhase, BuildSession};
use crate::event_bus::{BuildEvent, EventBus};
use crate::poller::{PollScheduler, TickOutcome};
use crate::remote::{BuildService, LogEntry, LogLevel, ProjectId, ProjectInfo, RemoteError};
use crate::workspace::FileWorkspace;

/// Length of the session name derived from the idea text.
const NAME_PREFIX_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum ControllerError {
    /// The project description was empty after trimming; rejected before
    /// any network call.
    #[error("project description must not be empty")]
    EmptyDescription,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

struct ControllerState {
    session: Option<BuildSession>,
    logs: Vec<LogEntry>,
    /// Bumped whenever the current session is superseded or torn down.
    epoch: u64,
}

impl ControllerState {
    /// The session a poll result may be applied to, or `None` if the result
    /// is stale (epoch moved on, or the session was replaced).
    fn current_session(&mut self, id: &ProjectId, epoch: u64) -> Option<&mut BuildSession> {
        if self.epoch != epoch {
            return None;
        }
        self.session.as_mut().filter(|s| &s.id == id)
    }
}

/// Drives one build session from creation through its terminal state.
///
/// Cloning is cheap; clones share the same session, timer, and workspace.
#[derive(Clone)]
pub struct BuildController {
    remote: Arc<dyn BuildService>,
    bus: Arc<EventBus>,
    workspace: FileWorkspace,
    scheduler: PollScheduler,
    state: Arc<Mutex<ControllerState>>,
}

impl BuildController {
    pub fn new(
        remote: Arc<dyn BuildService>,
        bus: Arc<EventBus>,
        workspace: FileWorkspace,
        scheduler: PollScheduler,
    ) -> Self {
        Self {
            remote,
            bus,
            workspace,
            scheduler,
            state: Arc::new(Mutex::new(ControllerState {
                session: None,
                logs: Vec::new(),
                epoch: 0,
            })),
        }
    }

    /// Create a session for `description` and start its build, replacing any
    /// previous session wholesale.
    ///
    /// On success the session is `Building`, a synthetic "Build started"
    /// entry is in the log view, and polling is running. On any failure the
    /// controller is back to idle with the failure recorded as a local log
    /// entry.
    pub fn start_build(&self, description: &str) -> Result<ProjectInfo, ControllerError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ControllerError::EmptyDescription);
        }

        // Supersede the previous session before any network call: stop its
        // timer, invalidate its in-flight results, drop its logs and files.
        self.scheduler.stop();
        {
            let mut state = self.state.lock().unwrap();
            state.epoch += 1;
            state.session = None;
            state.logs.clear();
        }
        self.workspace.detach();

        let name = derive_name(description);
        let project = match self.remote.create_project(&name, description) {
            Ok(project) => project,
            Err(e) => {
                self.record_local_failure(format!("Project creation failed: {e}"));
                return Err(e.into());
            }
        };

        let epoch = {
            let mut state = self.state.lock().unwrap();
            state.session = Some(BuildSession::new(
                project.id.clone(),
                project.name.clone(),
                project.description.clone(),
            ));
            state.epoch
        };
        self.workspace.attach(project.id.clone());
        self.bus.emit(BuildEvent::SessionCreated {
            project: project.clone(),
        });

        if let Err(e) = self.remote.start_build(&project.id) {
            self.state.lock().unwrap().session = None;
            self.workspace.detach();
            self.record_local_failure(format!("Build start failed: {e}"));
            return Err(e.into());
        }

        // Seed the log view locally so the observer never stares at an
        // empty panel during the first poll interval.
        let entry = local_entry(LogLevel::Info, "Build started");
        {
            let mut state = self.state.lock().unwrap();
            if let Some(session) = state.session.as_mut() {
                session.phase = BuildPhase::Building;
            }
            state.logs.push(entry.clone());
        }
        self.bus.emit(BuildEvent::PhaseChanged {
            phase: BuildPhase::Building,
        });
        self.bus.emit(BuildEvent::LogAppended { entry });

        let controller = self.clone();
        let tick_id = project.id.clone();
        self.scheduler
            .start(project.id.clone(), move || {
                controller.poll_once(&tick_id, epoch)
            });

        Ok(project)
    }

    /// One poll tick: fetch logs, then status, applying each under the
    /// stale-result guard.
    ///
    /// Logs are fetched first so a terminal status is never observed with a
    /// log view that predates it; a failed log fetch therefore skips the
    /// whole tick. Network failures never stop polling; the next tick is
    /// the retry.
    pub(crate) fn poll_once(&self, id: &ProjectId, epoch: u64) -> TickOutcome {
        let entries = match self.remote.fetch_logs(id) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("log poll failed for {id}: {e}; retrying next tick");
                return TickOutcome::Continue;
            }
        };
        {
            let mut state = self.state.lock().unwrap();
            if state.current_session(id, epoch).is_none() {
                log::debug!("discarding stale log result for {id}");
                return TickOutcome::Stop;
            }
            state.logs = entries.clone();
        }
        self.bus.emit(BuildEvent::LogsReplaced { entries });

        let status = match self.remote.fetch_status(id) {
            Ok(status) => status,
            Err(e) => {
                log::warn!("status poll failed for {id}: {e}; retrying next tick");
                return TickOutcome::Continue;
            }
        };

        let phase = BuildPhase::from_status(&status);
        let phase_changed = {
            let mut state = self.state.lock().unwrap();
            match state.current_session(id, epoch) {
                None => {
                    log::debug!("discarding stale status result for {id}");
                    return TickOutcome::Stop;
                }
                Some(session) => {
                    let changed = session.phase != phase;
                    session.phase = phase;
                    changed
                }
            }
        };
        if phase_changed {
            self.bus.emit(BuildEvent::PhaseChanged { phase });
        }

        if status.is_terminal() {
            self.bus.emit(BuildEvent::BuildFinished { status });
            if let Err(e) = self.workspace.refresh_listing() {
                log::warn!("file listing refresh after build end failed: {e}");
            }
            return TickOutcome::Stop;
        }
        TickOutcome::Continue
    }

    /// Tear down polling for the owning context (navigation away, shutdown).
    /// The session and its logs stay readable; in-flight poll results are
    /// invalidated.
    pub fn stop(&self) {
        self.scheduler.stop();
        self.state.lock().unwrap().epoch += 1;
    }

    /// Current lifecycle phase; `Idle` when no session exists.
    pub fn phase(&self) -> BuildPhase {
        self.state
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(BuildPhase::Idle)
    }

    /// Snapshot of the current session, if any.
    pub fn session(&self) -> Option<BuildSession> {
        self.state.lock().unwrap().session.clone()
    }

    /// Snapshot of the log view.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.lock().unwrap().logs.clone()
    }

    /// Whether the poll timer is running.
    pub fn is_polling(&self) -> bool {
        self.scheduler.is_active()
    }

    fn record_local_failure(&self, message: String) {
        log::error!("{message}");
        let entry = local_entry(LogLevel::Error, message);
        self.state.lock().unwrap().logs.push(entry.clone());
        self.bus.emit(BuildEvent::LogAppended { entry });
        self.bus.emit(BuildEvent::PhaseChanged {
            phase: BuildPhase::Idle,
        });
    }
}

/// Short session label: the idea's first characters, char-boundary safe.
fn derive_name(description: &str) -> String {
    description
        .chars()
        .take(NAME_PREFIX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}
