//! Application services that drive a snapshot run
//!
//! The resolution engine settles timetable entries; the action runner ties
//! the engine, the log and the action under test together.

pub mod simulation;
pub mod snap_action;

pub use simulation::{simulate, simulate_stream, SimulationOptions};
pub use snap_action::{
    snap_action, ActionContext, ActionReturn, ActionRun, Mocks, Proxies, RunResult,
};
