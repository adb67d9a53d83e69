//! Storage seams of the worker.
//!
//! Each file the worker touches sits behind an async trait so the worker
//! can be assembled from file-backed stores in production and from the
//! in-memory stores in [`memory`] under test.

pub mod event_log;
pub mod jobs;
pub mod memory;
pub mod settings;
pub mod state;

use std::fmt::Display;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use possync_core::error::{AppError, ErrorKind};
use possync_core::result::AppResult;
use possync_entity::{Event, IntegrationSettings, Job, WorkerState};

pub use event_log::FileEventLog;
pub use jobs::FileJobStore;
pub use settings::FileSettingsProvider;
pub use state::FileStateStore;

/// Read side of the append-only event log.
#[async_trait]
pub trait EventLog: Send + Sync + std::fmt::Debug {
    /// All well-formed events, in log order. A missing log is empty.
    async fn read_events(&self) -> AppResult<Vec<Event>>;
}

/// Persistence for the processed event ids.
#[async_trait]
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Load the persisted state. Missing or unreadable state is empty.
    async fn load(&self) -> WorkerState;

    /// Replace the persisted state.
    async fn save(&self, state: &WorkerState) -> AppResult<()>;
}

/// The job queue table.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Append a new job.
    async fn append_job(&self, job: &Job) -> AppResult<()>;

    /// All well-formed jobs, in file order.
    async fn read_jobs(&self) -> AppResult<Vec<Job>>;

    /// Replace the whole table.
    async fn write_jobs(&self, jobs: &[Job]) -> AppResult<()>;
}

/// Source of the integration settings, consulted on every tick.
#[async_trait]
pub trait SettingsProvider: Send + Sync + std::fmt::Debug {
    /// Current settings. A missing settings file means no integrations.
    async fn load(&self) -> AppResult<IntegrationSettings>;
}

/// Read a whole file as bytes, mapping "not found" to `None`.
///
/// Bytes rather than text so that one line of invalid UTF-8 cannot fail the
/// whole read.
pub(crate) async fn read_optional(path: &Path) -> AppResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read '{}'", path.display()),
            e,
        )),
    }
}

/// Parse newline-delimited records, skipping blank and malformed lines.
///
/// Each line is decoded on its own; a line that is not UTF-8 is malformed.
pub(crate) fn parse_ndjson<T, E, F>(content: &[u8], source: &Path, parse: F) -> Vec<T>
where
    F: Fn(&str) -> Result<T, E>,
    E: Display,
{
    content
        .split(|&b| b == b'\n')
        .enumerate()
        .filter_map(|(index, raw)| {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let outcome = match std::str::from_utf8(raw) {
                Ok(line) if line.trim().is_empty() => return None,
                Ok(line) => parse(line).map_err(|e| e.to_string()),
                Err(e) => Err(format!("invalid UTF-8: {e}")),
            };

            match outcome {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        "Skipping malformed line {} of '{}': {}",
                        index + 1,
                        source.display(),
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Write a file through a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> AppResult<()> {
    ensure_parent(path).await?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    fs::write(&tmp_path, content).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write '{}'", tmp_path.display()),
            e,
        )
    })?;

    fs::rename(&tmp_path, path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to replace '{}'", path.display()),
            e,
        )
    })
}

/// Ensure the parent directory of a path exists.
pub(crate) async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_skips_bad_lines() {
        let content = b"1\n\nnot-a-number\n3\r\n";
        let values: Vec<i64> = parse_ndjson(content, Path::new("numbers"), |l| l.parse::<i64>());
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn test_parse_ndjson_skips_invalid_utf8_line() {
        let content = b"1\n\xff\xfe 2\n3\n";
        let values: Vec<i64> = parse_ndjson(content, Path::new("numbers"), |l| l.parse::<i64>());
        assert_eq!(values, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_read_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(read_optional(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/file.json");
        write_atomic(&path, b"{}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("nested/deeper/file.json.tmp").exists());
    }
}
