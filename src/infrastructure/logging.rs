//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingSettings};
use crate::infrastructure::log_messages::configuration::LOGGING_INITIALIZED;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber writing through the test harness
///
/// `RUST_LOG` overrides the configured level. Returns `false` when a
/// subscriber was already installed, which is expected once per test binary.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer();

    let installed = match settings.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .is_ok();

    if installed {
        debug!(format = ?settings.format, "{}", LOGGING_INITIALIZED);
    }
    installed
}
