//! Log message constants for infrastructure components
//!
//! This module centralizes the tracing messages emitted by the harness so
//! the wording stays consistent between the timetable, engine and runner.

/// Timetable lifecycle messages
pub mod timetable {
    pub const REGISTERED: &str = "Registered pending entry";
    pub const SETTLED: &str = "Settled pending entry";
    pub const ENTRY_NOT_FOUND: &str = "No pending entry matches resolution";
    pub const REMOVED: &str = "Removed entries for deferred value";
    pub const RESET: &str = "Timetable reset";
}

/// Resolution engine messages
pub mod simulation {
    pub const STARTED: &str = "Starting resolution simulation";
    pub const STEP: &str = "Simulating resolution";
    pub const DRAINED: &str = "All resolutions simulated";
    pub const AUTO_EXHAUSTED: &str = "No pending entries left to auto-resolve";
    pub const AUTO_LIMIT_REACHED: &str = "Auto-resolve limit reached, ending simulation";
}

/// Action runner messages
pub mod action {
    pub const SYNC_DONE: &str = "Action returned synchronously";
    pub const AWAITING: &str = "Action returned a deferred value, racing it against simulation";
    pub const EVICTED: &str = "Evicted action's own deferred value from timetable";
    pub const RESOLVED: &str = "Action resolved";
    pub const REJECTED: &str = "Action rejected";
    pub const DID_NOT_RESOLVE: &str = "Action did not resolve after all resolutions";
    pub const FAILED: &str = "Simulation failed before action settled";
}

/// Ambient primitive messages
pub mod ambient {
    pub const INSTALLED: &str = "Intercepted primitives installed";
    pub const UNINSTALLED: &str = "Intercepted primitives uninstalled";
    pub const NETWORK_UNAVAILABLE: &str = "network access is not available outside the timetable";
}

/// Configuration messages
pub mod configuration {
    pub const LOADING_CONFIG: &str = "Loading configuration from environment";
    pub const LOGGING_INITIALIZED: &str = "Tracing subscriber initialized";
}
