//! Outbox transport: materializes each delivered job as a JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::fs;

use possync_entity::{IntegrationConfig, Job};

use crate::dispatcher::{DispatchError, Transport};

/// Logical prefix of artifact paths in job results.
const OUTBOX_PREFIX: &str = "outbox";

/// Snapshot of a job written to the outbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxArtifact {
    /// Job identifier.
    pub job_id: String,
    /// Target integration.
    pub integration: String,
    /// Job type.
    pub job_type: String,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// The triggering event.
    pub payload: Value,
}

impl From<&Job> for OutboxArtifact {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            integration: job.integration.clone(),
            job_type: job.job_type.clone(),
            created_at: job.created_at,
            payload: job.payload.clone(),
        }
    }
}

/// Writes `<root>/<integration>/<jobId>.json` for every delivered job.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    /// Root directory of the per-integration outboxes.
    root: PathBuf,
}

impl OutboxTransport {
    /// Create a transport rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative location of a job's artifact: `(integration dir, file name)`.
    ///
    /// Keys that lose characters to sanitizing are logged, since distinct
    /// keys such as `a.b` and `ab` then share one location.
    pub fn artifact_location(job: &Job) -> Option<(String, String)> {
        let (dir, dir_altered) = sanitize_segment(&job.integration.to_lowercase())?;
        if dir_altered {
            tracing::warn!(
                "Integration key '{}' sanitized to outbox directory '{}'",
                job.integration,
                dir
            );
        }

        let (stem, file_altered) = sanitize_segment(&job.job_id)?;
        if file_altered {
            tracing::warn!("Job id '{}' sanitized to outbox file '{}.json'", job.job_id, stem);
        }

        Some((dir, format!("{stem}.json")))
    }

    /// Absolute path of a job's artifact.
    pub fn artifact_path(&self, job: &Job) -> Option<PathBuf> {
        Self::artifact_location(job).map(|(dir, file)| self.root.join(dir).join(file))
    }
}

#[async_trait]
impl Transport for OutboxTransport {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn deliver(&self, job: &Job, _config: &IntegrationConfig) -> Result<Value, DispatchError> {
        let (dir, file) = Self::artifact_location(job).ok_or_else(|| {
            DispatchError::Permanent(format!(
                "cannot build outbox path for integration '{}' and job '{}'",
                job.integration, job.job_id
            ))
        })?;

        let target_dir = self.root.join(&dir);
        fs::create_dir_all(&target_dir).await.map_err(|e| {
            DispatchError::Transient(format!(
                "Failed to create outbox directory '{}': {}",
                target_dir.display(),
                e
            ))
        })?;

        let body = serde_json::to_vec_pretty(&OutboxArtifact::from(job))
            .map_err(|e| DispatchError::Permanent(format!("Failed to serialize job: {e}")))?;

        let target = target_dir.join(&file);
        fs::write(&target, &body).await.map_err(|e| {
            DispatchError::Transient(format!(
                "Failed to write outbox file '{}': {}",
                target.display(),
                e
            ))
        })?;

        tracing::debug!(path = %target.display(), bytes = body.len(), "Wrote outbox artifact");

        let logical = format!("{OUTBOX_PREFIX}/{dir}/{file}");
        Ok(json!({
            "url": format!("/{logical}"),
            "path": logical,
        }))
    }
}

/// Keep only characters that are safe in a single path segment. The flag is
/// set when anything was dropped.
fn sanitize_segment(raw: &str) -> Option<(String, bool)> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(128)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        let altered = cleaned != raw;
        Some((cleaned, altered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_artifact_under_lowercased_integration() {
        let dir = tempfile::tempdir().unwrap();
        let transport = OutboxTransport::new(dir.path().join("outbox"));
        let job = Job::new(
            "OneC",
            "STOCK_CHANGED",
            json!({"id": "e1", "type": "STOCK_CHANGED", "product_id": "p1", "new_quantity": 5}),
        );

        let receipt = transport
            .deliver(&job, &IntegrationConfig::default())
            .await
            .unwrap();

        let path = dir
            .path()
            .join("outbox")
            .join("onec")
            .join(format!("{}.json", job.job_id));
        assert!(path.exists());
        assert_eq!(transport.artifact_path(&job), Some(path.clone()));

        let artifact: OutboxArtifact =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(artifact, OutboxArtifact::from(&job));

        assert_eq!(
            receipt["path"],
            format!("outbox/onec/{}.json", job.job_id).as_str()
        );
        assert_eq!(
            receipt["url"],
            format!("/outbox/onec/{}.json", job.job_id).as_str()
        );
    }

    #[test]
    fn test_path_segments_are_sanitized() {
        let mut job = Job::new("../../etc", "STOCK_CHANGED", Value::Null);
        job.job_id = "a/b\\c".to_string();
        assert_eq!(
            OutboxTransport::artifact_location(&job),
            Some(("etc".to_string(), "abc.json".to_string()))
        );

        job.integration = "..".to_string();
        assert_eq!(OutboxTransport::artifact_location(&job), None);
    }

    #[test]
    fn test_sanitizing_reports_dropped_characters() {
        assert_eq!(sanitize_segment("onec"), Some(("onec".to_string(), false)));
        assert_eq!(sanitize_segment("kontur_v2-x"), Some(("kontur_v2-x".to_string(), false)));

        // Distinct keys that collapse to one segment are flagged.
        assert_eq!(sanitize_segment("a.b"), Some(("ab".to_string(), true)));
        assert_eq!(sanitize_segment("ab"), Some(("ab".to_string(), false)));
        assert_eq!(sanitize_segment("1\u{0441}"), Some(("1".to_string(), true)));
        assert_eq!(sanitize_segment("\u{0441}\u{0431}\u{0438}\u{0441}"), None);

        let long = "x".repeat(200);
        assert_eq!(sanitize_segment(&long), Some(("x".repeat(128), true)));
    }

    #[tokio::test]
    async fn test_unusable_key_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let transport = OutboxTransport::new(dir.path());
        let job = Job::new("///", "STOCK_CHANGED", Value::Null);

        let err = transport
            .deliver(&job, &IntegrationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Permanent(_)));
    }
}
