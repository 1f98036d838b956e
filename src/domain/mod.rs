//! Domain types for the replay harness
//!
//! Deferred values, resolution directives and the snapshot log, following
//! type-driven development principles.

pub mod deferred;
pub mod resolution;
pub mod snapshot;
pub mod types;

pub use deferred::*;
pub use resolution::*;
pub use snapshot::{Log, LogEntry};
pub use types::*;
