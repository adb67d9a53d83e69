//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::status::JobStatus;

/// One unit of outbound work for one integration.
///
/// Serialized as a single camelCase JSON line of the jobs file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier.
    pub job_id: String,
    /// Target integration key (`onec`, `rkeeper`, `kontur`, ...).
    pub integration: String,
    /// Type of the event that created the job.
    pub job_type: String,
    /// Current job status.
    pub status: JobStatus,
    /// Number of dispatch attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the first attempt started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job terminally failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    /// The triggering event.
    #[serde(default)]
    pub payload: Value,
    /// Delivery receipt on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error of the most recent failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Job {
    /// Create a queued job.
    pub fn new(integration: impl Into<String>, job_type: impl Into<String>, payload: Value) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            integration: integration.into(),
            job_type: job_type.into(),
            status: JobStatus::Queued,
            attempts: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            payload,
            result: None,
            last_error: None,
        }
    }

    /// Move a queued job to `in_progress` and count the attempt.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) {
        debug_assert!(self.status.can_transition_to(JobStatus::InProgress));
        self.status = JobStatus::InProgress;
        self.started_at.get_or_insert(now);
        self.attempts += 1;
    }

    /// Record a successful delivery.
    pub fn complete(&mut self, result: Value, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.result = Some(result);
        self.last_error = None;
    }

    /// Fail the job terminally.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.failed_at = Some(now);
        self.last_error = Some(error.into());
    }

    /// Record a failed attempt: back to `queued` while attempts remain,
    /// otherwise terminally `failed`. Returns the resulting status.
    pub fn retry_or_fail(
        &mut self,
        error: impl Into<String>,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> JobStatus {
        if self.can_retry(max_attempts) {
            self.status = JobStatus::Queued;
            self.last_error = Some(error.into());
        } else {
            self.fail(error, now);
        }
        self.status
    }

    /// Check if another attempt is allowed.
    pub fn can_retry(&self, max_attempts: u32) -> bool {
        !self.status.is_terminal() && self.attempts < max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        Job::new("onec", "STOCK_CHANGED", json!({"id": "e1"}))
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert!(Uuid::parse_str(&job.job_id).is_ok());
    }

    #[test]
    fn test_started_at_is_stamped_once() {
        let mut job = job();
        let first = Utc::now();
        job.begin_attempt(first);
        job.retry_or_fail("timeout", 3, first);
        let second = first + chrono::Duration::seconds(5);
        job.begin_attempt(second);
        assert_eq!(job.started_at, Some(first));
        assert_eq!(job.attempts, 2);
    }

    #[test]
    fn test_retry_until_exhausted() {
        let mut job = job();
        let now = Utc::now();
        for _ in 0..2 {
            job.begin_attempt(now);
            assert_eq!(job.retry_or_fail("boom", 3, now), JobStatus::Queued);
        }
        job.begin_attempt(now);
        assert_eq!(job.retry_or_fail("boom", 3, now), JobStatus::Failed);
        assert_eq!(job.attempts, 3);
        assert_eq!(job.failed_at, Some(now));
        assert_eq!(job.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let mut job = job();
        job.begin_attempt(Utc::now());
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("jobId").is_some());
        assert!(value.get("jobType").is_some());
        assert!(value.get("startedAt").is_some());
        assert_eq!(value["status"], "in_progress");
        assert!(value.get("failedAt").is_none());
    }
}
