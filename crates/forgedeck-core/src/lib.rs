//! # forgedeck-core
//!
//! Core logic for forgedeck, a control deck for remote autonomous-build
//! services: submit a project idea, watch the service's agents build it,
//! then browse and edit the generated files.
//!
//! This crate is framework-agnostic and can be used by:
//! - the forgedeck CLI
//! - a desktop or web shell (via the event bus)
//!
//! ## Key Concepts
//!
//! - **Session**: one build attempt on the service, with a lifecycle status
//! - **Poll tick**: one scheduled fetch-logs-then-fetch-status round-trip
//! - **BuildEvent**: typed broadcast of every observable controller change

pub mod config;
pub mod context;
pub mod event_bus;
pub mod poller;
pub mod remote;
pub mod session;
pub mod workspace;

// Re-export commonly used types
pub use context::{ForgedeckContext, ForgedeckContextBuilder};
pub use event_bus::{BuildEvent, EventBus};
pub use poller::{PollScheduler, TickOutcome, DEFAULT_POLL_INTERVAL};
pub use remote::{
    BuildService, BuildStatus, HttpBuildService, LogEntry, LogLevel, ProjectId, ProjectInfo,
    RemoteError,
};
pub use session::{BuildController, BuildPhase, BuildSession, ControllerError};
pub use workspace::{FileWorkspace, WorkspaceError};
