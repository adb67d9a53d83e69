//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod paths;
pub mod routing;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::paths::PathsConfig;
use self::routing::RoutingConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay). Every
/// section has defaults, so an empty configuration is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Locations of the files the worker reads and writes.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Tick cadence, batch limits and retry policy.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Which integrations receive jobs for each event type.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config_path` with an optional `config/{env}` overlay and
    /// environment variables prefixed with `POSSYNC__`.
    pub fn load(config_path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("POSSYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break the worker loop.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.worker.poll_interval_seconds == 0 {
            return Err(AppError::configuration(
                "worker.poll_interval_seconds must be greater than zero",
            ));
        }
        if self.worker.max_job_attempts == 0 {
            return Err(AppError::configuration(
                "worker.max_job_attempts must be at least 1",
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(AppError::configuration(
                "worker.concurrency must be at least 1",
            ));
        }
        if self.worker.event_window > self.worker.max_retained_event_ids {
            return Err(AppError::configuration(format!(
                "worker.event_window ({}) cannot exceed worker.max_retained_event_ids ({})",
                self.worker.event_window, self.worker.max_retained_event_ids
            )));
        }
        Ok(())
    }
}
