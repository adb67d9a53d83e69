//! Job dispatcher: checks integration enablement and hands jobs to a transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use possync_core::error::AppError;
use possync_entity::{IntegrationConfig, IntegrationSettings, Job};

/// `lastError` recorded for jobs whose integration is switched off.
pub const INTEGRATION_DISABLED: &str = "integration_disabled";

/// Outbound delivery channel for jobs.
///
/// The outbox writer is the built-in implementation; an HTTP client or a
/// message publisher plugs in here without touching the queue.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Deliver one job and return the receipt stored as the job result.
    async fn deliver(&self, job: &Job, config: &IntegrationConfig) -> Result<Value, DispatchError>;
}

/// Error from dispatching a job.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The target integration is missing or disabled and is never retried.
    #[error("integration_disabled")]
    Disabled,

    /// Permanent failure, not retried.
    #[error("Permanent dispatch failure: {0}")]
    Permanent(String),

    /// Transient failure, retried up to the attempt limit.
    #[error("Transient dispatch failure: {0}")]
    Transient(String),

    /// Internal error, retried like a transient failure.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl DispatchError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Internal(_))
    }
}

/// Decides enablement from the current settings and invokes the transport.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Delivery channel.
    transport: Arc<dyn Transport>,
    /// Upper bound for a single delivery.
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over `transport`.
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Dispatch one job using the settings loaded for this tick.
    pub async fn process_job(
        &self,
        job: &Job,
        settings: &IntegrationSettings,
    ) -> Result<Value, DispatchError> {
        let config = settings
            .get(&job.integration)
            .filter(|c| c.enabled)
            .ok_or(DispatchError::Disabled)?;

        tracing::debug!(
            "Dispatching job: id={}, integration='{}', transport='{}', attempt={}",
            job.job_id,
            job.integration,
            self.transport.name(),
            job.attempts
        );

        tokio::time::timeout(self.timeout, self.transport.deliver(job, config))
            .await
            .map_err(|_| {
                DispatchError::Transient(format!(
                    "delivery timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}
