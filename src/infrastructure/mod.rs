//! Infrastructure backing the harness
//!
//! The timetable and the primitives that feed it, plus tracing setup.

pub mod ambient;
pub mod intercept;
pub mod log_messages;
pub mod logging;
pub mod timetable;
