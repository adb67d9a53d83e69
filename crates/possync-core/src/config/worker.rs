//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Integration worker tick and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Interval in seconds between the end of one tick and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum number of queued jobs processed in a single tick.
    #[serde(default = "default_max_jobs_per_tick")]
    pub max_jobs_per_tick: usize,
    /// Attempts after which a failing job is terminally failed.
    #[serde(default = "default_max_job_attempts")]
    pub max_job_attempts: u32,
    /// Number of processed event ids kept in the persisted state.
    #[serde(default = "default_max_retained_event_ids")]
    pub max_retained_event_ids: usize,
    /// Maximum number of unprocessed events handled per tick.
    #[serde(default = "default_event_window")]
    pub event_window: usize,
    /// Number of jobs dispatched concurrently within a tick.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Upper bound in seconds for a single dispatch.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_jobs_per_tick: default_max_jobs_per_tick(),
            max_job_attempts: default_max_job_attempts(),
            max_retained_event_ids: default_max_retained_event_ids(),
            event_window: default_event_window(),
            concurrency: default_concurrency(),
            dispatch_timeout_seconds: default_dispatch_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_jobs_per_tick() -> usize {
    25
}

fn default_max_job_attempts() -> u32 {
    3
}

fn default_max_retained_event_ids() -> usize {
    2000
}

fn default_event_window() -> usize {
    100
}

fn default_concurrency() -> usize {
    4
}

fn default_dispatch_timeout() -> u64 {
    30
}
