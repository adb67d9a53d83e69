//! Integration settings inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use possync_core::config::AppConfig;
use possync_core::error::AppError;
use possync_entity::IntegrationSettings;
use possync_worker::store::{FileSettingsProvider, SettingsProvider};

/// Arguments for settings commands
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Settings subcommand
    #[command(subcommand)]
    pub command: SettingsCommand,
}

/// Settings subcommands
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// List integrations and whether they are enabled
    Show,
}

/// Integration row. Connection details are listed by key only.
#[derive(Debug, Serialize, Tabled)]
struct IntegrationRow {
    #[tabled(rename = "Integration")]
    integration: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Settings")]
    #[serde(skip)]
    detail_keys: String,
}

fn rows(settings: &IntegrationSettings) -> Vec<IntegrationRow> {
    settings
        .iter()
        .map(|(key, config)| IntegrationRow {
            integration: key.clone(),
            enabled: config.enabled,
            detail_keys: config
                .extra
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

/// Execute settings commands
pub async fn execute(
    args: &SettingsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        SettingsCommand::Show => {
            let settings = FileSettingsProvider::new(&config.paths.settings_file)
                .load()
                .await?;
            if settings.is_empty() && format == OutputFormat::Table {
                output::print_warning(&format!(
                    "No integrations configured in '{}'; every job will fail as integration_disabled",
                    config.paths.settings_file
                ));
            }
            output::print_list(&rows(&settings), format);
        }
    }

    Ok(())
}
