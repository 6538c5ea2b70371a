//! Build session lifecycle: state types and the controller driving them.

pub mod controller;
pub mod state;

pub use controller::{BuildController, ControllerError};
pub use state::{BuildPhase, BuildSession, LOCAL_AGENT};
