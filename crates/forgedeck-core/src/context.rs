//! ForgedeckContext - the shared state every interface operates on.
//!
//! Centralizing the bus, remote client, controller, and workspace here keeps
//! interfaces thin: a frontend constructs one context at startup and forwards
//! calls. All fields are `Arc`-cheap, so cloning the context clones pointers,
//! not data, and every clone observes the same session.

use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::event_bus::EventBus;
use crate::poller::PollScheduler;
use crate::remote::{BuildService, HttpBuildService};
use crate::session::BuildController;
use crate::workspace::FileWorkspace;

/// Configuration for building a [`ForgedeckContext`].
#[derive(Default)]
pub struct ForgedeckContextBuilder {
    api_url: Option<String>,
    event_bus: Option<Arc<EventBus>>,
    remote: Option<Arc<dyn BuildService>>,
    poll_interval: Option<Duration>,
}

impl ForgedeckContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL for the build service, taking precedence over the
    /// environment override.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Use an existing EventBus (for testing or custom configurations).
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Use a custom remote client (for testing or custom configurations).
    pub fn remote(mut self, remote: Arc<dyn BuildService>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Use a non-standard poll interval (for testing).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn build(self) -> ForgedeckContext {
        let event_bus = self.event_bus.unwrap_or_else(|| Arc::new(EventBus::new()));
        let remote: Arc<dyn BuildService> = match self.remote {
            Some(remote) => remote,
            None => {
                let url = self.api_url.unwrap_or_else(config::api_url_from_env);
                Arc::new(HttpBuildService::new(url))
            }
        };
        let scheduler = self
            .poll_interval
            .map(PollScheduler::with_interval)
            .unwrap_or_default();
        let workspace = FileWorkspace::new(Arc::clone(&remote), Arc::clone(&event_bus));
        let controller = BuildController::new(
            Arc::clone(&remote),
            Arc::clone(&event_bus),
            workspace.clone(),
            scheduler,
        );

        ForgedeckContext {
            event_bus,
            remote,
            workspace,
            controller,
        }
    }
}

/// Shared state for all forgedeck operations.
#[derive(Clone)]
pub struct ForgedeckContext {
    /// Bus publishing every observable controller change.
    pub event_bus: Arc<EventBus>,
    /// Direct access to the remote client for one-shot queries (health,
    /// agent roster) that bypass the session machinery.
    pub remote: Arc<dyn BuildService>,
    /// File listing and edit buffer for the current session.
    pub workspace: FileWorkspace,
    /// The build-session lifecycle controller.
    pub controller: BuildController,
}

impl ForgedeckContext {
    pub fn builder() -> ForgedeckContextBuilder {
        ForgedeckContextBuilder::new()
    }
}

impl Default for ForgedeckContext {
    fn default() -> Self {
        Self::builder().build()
    }
}
