//! Integration job inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use possync_core::config::AppConfig;
use possync_core::error::AppError;
use possync_entity::{Job, JobStatus};
use possync_worker::store::{FileJobStore, JobStore};

/// Arguments for job commands
#[derive(Debug, Args)]
pub struct JobsArgs {
    /// Jobs subcommand
    #[command(subcommand)]
    pub command: JobsCommand,
}

/// Job subcommands
#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List jobs, newest first
    List {
        /// Only jobs with this status (queued, in_progress, completed, failed)
        #[arg(short, long)]
        status: Option<JobStatus>,
        /// Only jobs for this integration
        #[arg(short, long)]
        integration: Option<String>,
        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show one job in full
    Show {
        /// Job identifier
        job_id: String,
    },
}

/// Job table row
#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    #[tabled(rename = "Job ID")]
    job_id: String,
    #[tabled(rename = "Integration")]
    integration: String,
    #[tabled(rename = "Type")]
    job_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Last Error")]
    last_error: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            integration: job.integration.clone(),
            job_type: job.job_type.clone(),
            status: job.status.to_string(),
            attempts: job.attempts,
            created_at: output::fmt_time(Some(job.created_at)),
            last_error: job
                .last_error
                .as_deref()
                .map(|e| output::truncate(e, 40))
                .unwrap_or_default(),
        }
    }
}

/// Execute job commands
pub async fn execute(
    args: &JobsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let jobs = FileJobStore::new(&config.paths.jobs_file).read_jobs().await?;

    match &args.command {
        JobsCommand::List {
            status,
            integration,
            limit,
        } => {
            let selected = filter_jobs(&jobs, *status, integration.as_deref(), *limit);
            match format {
                OutputFormat::Json => output::print_json(&selected),
                OutputFormat::Table => {
                    let rows: Vec<JobRow> = selected.iter().map(|j| JobRow::from(*j)).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        JobsCommand::Show { job_id } => {
            let job = jobs
                .iter()
                .find(|j| &j.job_id == job_id)
                .ok_or_else(|| AppError::not_found(format!("Job '{}' not found", job_id)))?;

            match format {
                OutputFormat::Json => output::print_json(job),
                OutputFormat::Table => print_job(job),
            }
        }
    }

    Ok(())
}

/// Newest jobs first, filtered and limited.
fn filter_jobs<'a>(
    jobs: &'a [Job],
    status: Option<JobStatus>,
    integration: Option<&str>,
    limit: usize,
) -> Vec<&'a Job> {
    jobs.iter()
        .rev()
        .filter(|j| status.is_none_or(|s| j.status == s))
        .filter(|j| integration.is_none_or(|k| j.integration.eq_ignore_ascii_case(k)))
        .take(limit)
        .collect()
}

fn print_job(job: &Job) {
    output::print_heading(&format!("Job {}", job.job_id));
    output::print_kv("Integration", &job.integration);
    output::print_kv("Type", &job.job_type);
    output::print_kv("Status", job.status.as_str());
    output::print_kv("Attempts", &job.attempts.to_string());
    output::print_kv("Created", &output::fmt_time(Some(job.created_at)));
    output::print_kv("Started", &output::fmt_time(job.started_at));
    output::print_kv("Completed", &output::fmt_time(job.completed_at));
    output::print_kv("Failed", &output::fmt_time(job.failed_at));
    if let Some(error) = &job.last_error {
        output::print_kv("Last error", error);
    }
    if let Some(result) = &job.result {
        output::print_kv("Result", &result.to_string());
    }
    output::print_kv("Payload", &job.payload.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jobs() -> Vec<Job> {
        let mut failed = Job::new("rkeeper", "PRODUCT_UPDATED", json!({"id": "e1"}));
        failed.fail("integration_disabled", chrono::Utc::now());
        vec![
            Job::new("onec", "STOCK_CHANGED", json!({"id": "e1"})),
            failed,
            Job::new("onec", "DOCUMENT_POSTED", json!({"id": "e2"})),
        ]
    }

    #[test]
    fn test_filter_newest_first() {
        let jobs = jobs();
        let picked = filter_jobs(&jobs, None, Some("ONEC"), 10);
        let types: Vec<&str> = picked.iter().map(|j| j.job_type.as_str()).collect();
        assert_eq!(types, vec!["DOCUMENT_POSTED", "STOCK_CHANGED"]);
    }

    #[test]
    fn test_filter_by_status_and_limit() {
        let jobs = jobs();
        assert_eq!(filter_jobs(&jobs, Some(JobStatus::Failed), None, 10).len(), 1);
        assert_eq!(filter_jobs(&jobs, Some(JobStatus::Queued), None, 1).len(), 1);
    }

    #[test]
    fn test_row_truncates_error() {
        let mut job = Job::new("onec", "STOCK_CHANGED", json!({}));
        job.last_error = Some("x".repeat(100));
        assert_eq!(JobRow::from(&job).last_error.chars().count(), 40);
    }

    #[tokio::test]
    async fn test_show_reads_the_jobs_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::commands::testing::config_in(dir.path());
        let job = Job::new("onec", "STOCK_CHANGED", json!({"id": "e1"}));
        FileJobStore::new(&config.paths.jobs_file)
            .append_job(&job)
            .await
            .unwrap();

        let show = |job_id: &str| JobsArgs {
            command: JobsCommand::Show {
                job_id: job_id.to_string(),
            },
        };

        execute(&show(&job.job_id), &config, OutputFormat::Json)
            .await
            .unwrap();

        let err = execute(&show("missing"), &config, OutputFormat::Table)
            .await
            .unwrap_err();
        assert_eq!(err.kind, possync_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_without_jobs_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::commands::testing::config_in(dir.path());
        let args = JobsArgs {
            command: JobsCommand::List {
                status: Some(JobStatus::Failed),
                integration: None,
                limit: 10,
            },
        };

        execute(&args, &config, OutputFormat::Table).await.unwrap();
        assert!(!dir.path().join("integration_jobs.ndjson").exists());
    }
}
