//! NDJSON job queue file.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use possync_core::error::{AppError, ErrorKind};
use possync_core::result::AppResult;
use possync_entity::Job;

use super::{ensure_parent, parse_ndjson, read_optional, write_atomic, JobStore};

/// Flat-file job table: one JSON job per line.
///
/// New jobs are appended; updates rewrite the whole file. The worker is
/// the only process that rewrites it.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    /// Path of the jobs file.
    path: PathBuf,
}

impl FileJobStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn append_job(&self, job: &Job) -> AppResult<()> {
        ensure_parent(&self.path).await?;

        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open '{}'", self.path.display()),
                    e,
                )
            })?;

        file.write_all(&line).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to append job", e)
        })?;
        file.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush jobs file", e))?;

        tracing::debug!(
            "Appended job: id={}, integration='{}', type='{}'",
            job.job_id,
            job.integration,
            job.job_type
        );
        Ok(())
    }

    async fn read_jobs(&self) -> AppResult<Vec<Job>> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };

        Ok(parse_ndjson(&content, &self.path, |line| {
            serde_json::from_str::<Job>(line)
        }))
    }

    async fn write_jobs(&self, jobs: &[Job]) -> AppResult<()> {
        let mut body = Vec::new();
        for job in jobs {
            serde_json::to_writer(&mut body, job)?;
            body.push(b'\n');
        }
        write_atomic(&self.path, &body).await
    }
}
