//! Queue and worker status.

use serde::Serialize;

use crate::output::{self, OutputFormat};
use possync_core::config::AppConfig;
use possync_core::config::worker::WorkerConfig;
use possync_core::error::AppError;
use possync_worker::queue::QueueStats;
use possync_worker::store::{
    FileJobStore, FileSettingsProvider, FileStateStore, JobStore, SettingsProvider, StateStore,
};

/// Everything `status` reports
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    jobs: QueueStats,
    processed_event_ids: usize,
    enabled_integrations: Option<Vec<String>>,
    worker: &'a WorkerConfig,
}

/// Execute the status command
pub async fn execute(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let report = collect(config).await?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_heading("Job Queue");
            output::print_kv("Queued", &report.jobs.queued.to_string());
            output::print_kv("In progress", &report.jobs.in_progress.to_string());
            output::print_kv("Completed", &report.jobs.completed.to_string());
            output::print_kv(
                "Failed",
                &format!(
                    "{} ({} integration_disabled)",
                    report.jobs.failed, report.jobs.disabled
                ),
            );
            output::print_kv("Total", &report.jobs.total().to_string());

            output::print_heading("Worker");
            output::print_kv(
                "Processed event ids",
                &format!(
                    "{}/{}",
                    report.processed_event_ids, config.worker.max_retained_event_ids
                ),
            );
            output::print_kv(
                "Enabled integrations",
                &report
                    .enabled_integrations
                    .as_ref()
                    .map(|keys| if keys.is_empty() { "none".to_string() } else { keys.join(", ") })
                    .unwrap_or_else(|| "unknown".to_string()),
            );
            output::print_kv(
                "Poll interval",
                &format!("{}s", config.worker.poll_interval_seconds),
            );
            output::print_kv(
                "Batch / attempts",
                &format!(
                    "{} jobs per tick, {} attempts",
                    config.worker.max_jobs_per_tick, config.worker.max_job_attempts
                ),
            );
        }
    }

    Ok(())
}

/// Read the job table, worker state and settings into one report.
///
/// Unreadable settings are warned about and reported as unknown.
async fn collect(config: &AppConfig) -> Result<StatusReport<'_>, AppError> {
    let jobs = FileJobStore::new(&config.paths.jobs_file).read_jobs().await?;
    let state = FileStateStore::new(
        &config.paths.state_file,
        config.worker.max_retained_event_ids,
    )
    .load()
    .await;

    let enabled_integrations = match FileSettingsProvider::new(&config.paths.settings_file)
        .load()
        .await
    {
        Ok(settings) => Some(
            settings
                .iter()
                .filter(|(_, c)| c.enabled)
                .map(|(key, _)| key.clone())
                .collect(),
        ),
        Err(e) => {
            output::print_warning(&format!("Integration settings unreadable: {}", e));
            None
        }
    };

    Ok(StatusReport {
        jobs: QueueStats::from_jobs(&jobs),
        processed_event_ids: state.processed_event_ids.len(),
        enabled_integrations,
        worker: &config.worker,
    })
}
