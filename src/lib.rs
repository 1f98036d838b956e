//! Replay Snapshot - a deterministic replay harness for async actions
//!
//! Intercepts every pending asynchronous operation an action creates, settles
//! each one in the order a test dictates (or in creation order), and records
//! every observable side effect as an ordered, serializable snapshot log.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{
    simulate, simulate_stream, snap_action, ActionContext, ActionReturn, ActionRun, Mocks,
    Proxies, SimulationOptions,
};
pub use config::{Settings, SnapOptions};
pub use domain::{Deferred, Log, LogEntry, Payload, Resolution, ResolutionKind, Settlement, Settler};
pub use error::{Error, Result, RunFailure};
pub use infrastructure::ambient;
pub use infrastructure::intercept::{AsyncPrimitives, NativePrimitives};
pub use infrastructure::timetable::Timetable;

/// Everything a test usually needs in one import
pub mod prelude {
    pub use crate::{
        ambient, snap_action, ActionContext, ActionReturn, ActionRun, AsyncPrimitives, Deferred,
        Log, LogEntry, Mocks, Payload, Proxies, Resolution, ResolutionKind, RunFailure,
        Settlement, Settler, SnapOptions, Timetable,
    };
}
