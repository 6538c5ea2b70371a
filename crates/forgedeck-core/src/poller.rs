//! Recurring poll timer with strict start/stop discipline.
//!
//! One [`PollScheduler`] owns at most one live timer. `start` registers the
//! timer and spawns a worker thread that fires the tick callback once per
//! interval; `stop` deregisters it and wakes the worker so it exits before
//! the next tick. The worker checks its registration under the scheduler
//! lock before every tick, so after `stop()` returns no new tick begins. A
//! tick that is already executing when `stop` is called may run to
//! completion; callers discard its results through their own session guard.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::remote::ProjectId;

/// Interval between poll ticks for a running session.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What the tick callback wants the scheduler to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep polling.
    Continue,
    /// Deregister the timer; the session reached a terminal state.
    Stop,
}

struct ActiveTimer {
    project: ProjectId,
    generation: u64,
}

#[derive(Default)]
struct SchedulerState {
    active: Option<ActiveTimer>,
    next_generation: u64,
}

#[derive(Default)]
struct SchedulerShared {
    state: Mutex<SchedulerState>,
    wake: Condvar,
}

/// Owned recurring timer for one observation context.
///
/// Cloning is cheap and clones share the same timer slot, so every holder
/// sees the one at-most-one-active-timer registration.
#[derive(Clone)]
pub struct PollScheduler {
    interval: Duration,
    shared: Arc<SchedulerShared>,
}

impl PollScheduler {
    /// Scheduler with the standard interval.
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Scheduler with a custom interval. The interval is fixed for the
    /// scheduler's lifetime; it can never vary per `start` call.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            shared: Arc::new(SchedulerShared::default()),
        }
    }

    /// Begin ticking for `project`. Returns `false` (and does nothing) if a
    /// timer is already active for any session.
    ///
    /// The first tick fires one full interval after `start` returns; each
    /// subsequent tick one interval after the previous tick completed.
    pub fn start(
        &self,
        project: ProjectId,
        mut tick: impl FnMut() -> TickOutcome + Send + 'static,
    ) -> bool {
        let generation = {
            let mut state = self.shared.state.lock().unwrap();
            if let Some(active) = &state.active {
                log::warn!(
                    "poll timer already active for {}; ignoring start for {project}",
                    active.project
                );
                return false;
            }
            state.next_generation += 1;
            state.active = Some(ActiveTimer {
                project: project.clone(),
                generation: state.next_generation,
            });
            state.next_generation
        };

        let shared = Arc::clone(&self.shared);
        let interval = self.interval;
        std::thread::spawn(move || {
            log::debug!("poll timer started for {project}");
            loop {
                let deadline = Instant::now() + interval;
                let mut state = shared.state.lock().unwrap();
                loop {
                    if !is_current(&state, generation) {
                        log::debug!("poll timer for {project} cancelled");
                        return;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    let (relocked, _) = shared.wake.wait_timeout(state, deadline - now).unwrap();
                    state = relocked;
                }
                drop(state);

                if tick() == TickOutcome::Stop {
                    let mut state = shared.state.lock().unwrap();
                    if is_current(&state, generation) {
                        state.active = None;
                    }
                    log::debug!("poll timer for {project} stopped by tick");
                    return;
                }
            }
        });
        true
    }

    /// Cancel the outstanding timer. Safe no-op when nothing is active.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if let Some(active) = state.active.take() {
            log::debug!("poll timer for {} stopped", active.project);
            self.shared.wake.notify_all();
        }
    }

    /// Whether a timer is currently registered.
    pub fn is_active(&self) -> bool {
        self.shared.state.lock().unwrap().active.is_some()
    }

    /// Session the active timer polls, if any.
    pub fn active_project(&self) -> Option<ProjectId> {
        self.shared
            .state
            .lock()
            .unwrap()
            .active
            .as_ref()
            .map(|a| a.project.clone())
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn is_current(state: &SchedulerState, generation: u64) -> bool {
    state.active.as_ref().map(|a| a.generation) == Some(generation)
}
