//! NDJSON event log reader.

use std::path::PathBuf;

use async_trait::async_trait;

use possync_core::result::AppResult;
use possync_entity::Event;

use super::{parse_ndjson, read_optional, EventLog};

/// Reads the event log appended by the point-of-sale application.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    /// Path of the log file.
    path: PathBuf,
}

impl FileEventLog {
    /// Create a reader for the log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn read_events(&self) -> AppResult<Vec<Event>> {
        let Some(content) = read_optional(&self.path).await? else {
            tracing::trace!("Event log '{}' does not exist yet", self.path.display());
            return Ok(Vec::new());
        };

        Ok(parse_ndjson(&content, &self.path, Event::parse_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_and_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");

        let log = FileEventLog::new(&path);
        assert!(log.read_events().await.unwrap().is_empty());

        std::fs::write(&path, "").unwrap();
        assert!(log.read_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        std::fs::write(
            &path,
            concat!(
                "{\"id\":\"e1\",\"type\":\"PRODUCT_UPDATED\",\"product_id\":\"p1\"}\n",
                "{\"id\":\"e2\",\"type\":\n",
                "42\n",
                "{\"id\":\"e3\",\"type\":\"DOCUMENT_POSTED\",\"document_id\":\"d1\"}\n",
            ),
        )
        .unwrap();

        let events = FileEventLog::new(&path).read_events().await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_hide_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut content = Vec::new();
        content.extend_from_slice(b"{\"id\":\"e1\",\"type\":\"PRODUCT_UPDATED\",\"product_id\":\"p1\"}\n");
        content.extend_from_slice(b"\xff\xfe garbage\n");
        content.extend_from_slice(b"{\"id\":\"e2\",\"type\":\"PRODUCT_UPDATED\",\"product_id\":\"p2\"}\n");
        std::fs::write(&path, content).unwrap();

        let events = FileEventLog::new(&path).read_events().await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }
}
