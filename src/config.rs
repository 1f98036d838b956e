use crate::application::simulation::SimulationOptions;
use crate::domain::types::AutoResolveLimit;
use crate::infrastructure::log_messages::configuration::LOADING_CONFIG;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

/// Prefix for environment variable overrides, e.g. `REPLAY_SNAPSHOT__SNAPSHOT__AUTO_RESOLVE`
pub const ENV_PREFIX: &str = "REPLAY_SNAPSHOT";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub snapshot: SnapOptions,
    pub logging: LoggingSettings,
}

/// Toggles for a single snapshot run
///
/// `Default` is the reset state: every toggle off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapOptions {
    /// Settle pending entries in registration order, ignoring directive order
    pub auto_resolve: bool,
    /// Record the state, getters and payload the action was called with
    pub snap_env: bool,
    /// Keep the action's own deferred value addressable by directives
    pub allow_manual_action_resolution: bool,
    pub auto_resolve_limit: AutoResolveLimit,
}

impl SnapOptions {
    pub fn simulation(&self) -> SimulationOptions {
        SimulationOptions {
            auto_resolve: self.auto_resolve,
            auto_resolve_limit: self.auto_resolve_limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        debug!(environment = %environment, "{}", LOADING_CONFIG);

        let config = defaults()?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load defaults overlaid with a single explicit file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let limit = i64::try_from(*AutoResolveLimit::default().as_ref()).unwrap_or(i64::MAX);

    Config::builder()
        .set_default("snapshot.auto_resolve", false)?
        .set_default("snapshot.snap_env", false)?
        .set_default("snapshot.allow_manual_action_resolution", false)?
        .set_default("snapshot.auto_resolve_limit", limit)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "compact")
}
