//! Job queue: enqueues jobs and drains a bounded batch per tick.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use possync_core::config::worker::WorkerConfig;
use possync_core::result::AppResult;
use possync_entity::{IntegrationSettings, Job, JobStatus};

use crate::dispatcher::{DispatchError, Dispatcher, INTEGRATION_DISABLED};
use crate::store::JobStore;

/// Batch and retry limits of the queue processor.
#[derive(Debug, Clone, Copy)]
pub struct QueuePolicy {
    /// Jobs processed per tick.
    pub max_jobs_per_tick: usize,
    /// Attempts before a job is terminally failed.
    pub max_job_attempts: u32,
    /// Concurrent dispatches within a tick.
    pub concurrency: usize,
}

impl From<&WorkerConfig> for QueuePolicy {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            max_jobs_per_tick: config.max_jobs_per_tick,
            max_job_attempts: config.max_job_attempts,
            concurrency: config.concurrency.max(1),
        }
    }
}

/// Outcome counts of one queue pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTickReport {
    /// Jobs picked up this tick.
    pub processed: usize,
    /// Jobs delivered.
    pub completed: usize,
    /// Jobs put back to `queued`.
    pub retried: usize,
    /// Jobs terminally failed.
    pub failed: usize,
}

/// Job queue over a [`JobStore`].
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Job table
    store: Arc<dyn JobStore>,
    /// Dispatcher for queued jobs
    dispatcher: Arc<Dispatcher>,
    /// Batch and retry limits
    policy: QueuePolicy,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(store: Arc<dyn JobStore>, dispatcher: Arc<Dispatcher>, policy: QueuePolicy) -> Self {
        Self {
            store,
            dispatcher,
            policy,
        }
    }

    /// Append a new job
    pub async fn enqueue(&self, job: &Job) -> AppResult<()> {
        self.store.append_job(job).await?;

        tracing::debug!(
            "Enqueued job: id={}, integration='{}', type='{}'",
            job.job_id,
            job.integration,
            job.job_type
        );
        Ok(())
    }

    /// Process up to `max_jobs_per_tick` queued jobs in file order.
    ///
    /// The table is rewritten once, and only if a job was picked up.
    pub async fn process_queued(&self, settings: &IntegrationSettings) -> AppResult<QueueTickReport> {
        self.process_queued_except(settings, &HashSet::new()).await
    }

    /// Like [`process_queued`](Self::process_queued), leaving the jobs in
    /// `deferred` queued for a later pass.
    pub async fn process_queued_except(
        &self,
        settings: &IntegrationSettings,
        deferred: &HashSet<String>,
    ) -> AppResult<QueueTickReport> {
        let mut jobs = self.store.read_jobs().await?;

        let selected: Vec<usize> = jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.status == JobStatus::Queued && !deferred.contains(&job.job_id))
            .map(|(index, _)| index)
            .take(self.policy.max_jobs_per_tick)
            .collect();

        if selected.is_empty() {
            tracing::trace!("No queued jobs");
            return Ok(QueueTickReport::default());
        }

        let started = Utc::now();
        for &index in &selected {
            jobs[index].begin_attempt(started);
        }

        let deliveries: Vec<_> = selected
            .iter()
            .map(|&index| self.dispatcher.process_job(&jobs[index], settings))
            .collect();
        let outcomes: Vec<Result<Value, DispatchError>> = stream::iter(deliveries)
            .buffered(self.policy.concurrency)
            .collect()
            .await;

        let mut report = QueueTickReport {
            processed: selected.len(),
            ..QueueTickReport::default()
        };

        for (&index, outcome) in selected.iter().zip(outcomes) {
            let job = &mut jobs[index];
            match self.apply_outcome(job, outcome) {
                JobStatus::Completed => report.completed += 1,
                JobStatus::Queued => report.retried += 1,
                _ => report.failed += 1,
            }
        }

        self.store.write_jobs(&jobs).await?;
        Ok(report)
    }

    /// Record one dispatch outcome on its job and return the new status.
    fn apply_outcome(&self, job: &mut Job, outcome: Result<Value, DispatchError>) -> JobStatus {
        let now = Utc::now();
        match outcome {
            Ok(result) => {
                job.complete(result, now);
                tracing::info!(
                    "Job {} completed: integration='{}', type='{}'",
                    job.job_id,
                    job.integration,
                    job.job_type
                );
            }
            Err(err) if err.is_retryable() => {
                let status = job.retry_or_fail(err.to_string(), self.policy.max_job_attempts, now);
                if status == JobStatus::Queued {
                    tracing::warn!(
                        "Job {} failed (attempt {}/{}), will retry: {}",
                        job.job_id,
                        job.attempts,
                        self.policy.max_job_attempts,
                        err
                    );
                } else {
                    tracing::error!(
                        "Job {} failed after {} attempts: {}",
                        job.job_id,
                        job.attempts,
                        err
                    );
                }
            }
            Err(DispatchError::Disabled) => {
                job.fail(INTEGRATION_DISABLED, now);
                tracing::warn!(
                    "Job {} failed: integration '{}' is disabled",
                    job.job_id,
                    job.integration
                );
            }
            Err(err) => {
                let reason = match err {
                    DispatchError::Permanent(msg) => msg,
                    other => other.to_string(),
                };
                tracing::error!("Job {} failed permanently: {}", job.job_id, reason);
                job.fail(reason, now);
            }
        }
        job.status
    }

    /// Get queue statistics
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let jobs = self.store.read_jobs().await?;
        Ok(QueueStats::from_jobs(&jobs))
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of queued jobs
    pub queued: usize,
    /// Number of jobs left in progress
    pub in_progress: usize,
    /// Number of completed jobs
    pub completed: usize,
    /// Number of failed jobs
    pub failed: usize,
    /// Failed jobs whose integration was disabled
    pub disabled: usize,
}

impl QueueStats {
    /// Count jobs per status.
    pub fn from_jobs(jobs: &[Job]) -> Self {
        jobs.iter().fold(Self::default(), |mut stats, job| {
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::InProgress => stats.in_progress += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => {
                    stats.failed += 1;
                    if job.last_error.as_deref() == Some(INTEGRATION_DISABLED) {
                        stats.disabled += 1;
                    }
                }
            }
            stats
        })
    }

    /// Total number of jobs.
    pub fn total(&self) -> usize {
        self.queued + self.in_progress + self.completed + self.failed
    }
}
