//! CLI command definitions and dispatch.

pub mod events;
pub mod jobs;
pub mod settings;
pub mod status;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use possync_core::config::AppConfig;
use possync_core::error::AppError;

/// possync: inspect the integration worker's queue and inputs
#[derive(Debug, Parser)]
#[command(name = "possync", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Configuration environment overlay
    #[arg(long, env = "POSSYNC_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show job counts and worker settings
    Status,
    /// Inspect integration jobs
    Jobs(jobs::JobsArgs),
    /// Inspect the event log
    Events(events::EventsArgs),
    /// Inspect integration settings
    Settings(settings::SettingsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config, &self.env)?;

        match &self.command {
            Commands::Status => status::execute(&config, self.format).await,
            Commands::Jobs(args) => jobs::execute(args, &config, self.format).await,
            Commands::Events(args) => events::execute(args, &config, self.format).await,
            Commands::Settings(args) => settings::execute(args, &config, self.format).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use possync_core::config::AppConfig;

    /// Configuration whose data files all live in `dir`.
    pub(crate) fn config_in(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        config.paths.events_log = path("events.ndjson");
        config.paths.jobs_file = path("integration_jobs.ndjson");
        config.paths.state_file = path("integration_worker_state.json");
        config.paths.settings_file = path("integration_settings.json");
        config.paths.outbox_dir = path("outbox");
        config
    }
}
