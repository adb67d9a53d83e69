//! `DOCUMENT_POSTED` handler.

use async_trait::async_trait;

use possync_entity::{Event, EventPayload, IntegrationSettings, Job};

use super::{jobs_for_enabled, log_untyped, EventHandler, HandlerError};

/// Sends posted documents to accounting and fiscal integrations
#[derive(Debug)]
pub struct DocumentPostedHandler {
    /// Integrations that receive posted documents
    targets: Vec<String>,
}

impl DocumentPostedHandler {
    /// Create a new document handler
    pub fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl EventHandler for DocumentPostedHandler {
    fn event_type(&self) -> &str {
        EventPayload::DOCUMENT_POSTED
    }

    async fn handle(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Vec<Job>, HandlerError> {
        let jobs = jobs_for_enabled(&self.targets, event, settings);

        match &event.payload {
            EventPayload::DocumentPosted(document) => tracing::info!(
                "Document {} ({}) posted: {} job(s)",
                document.document_id,
                document.document_type.as_deref().unwrap_or("unspecified"),
                jobs.len()
            ),
            EventPayload::Untyped => log_untyped(event, jobs.len()),
            _ => return Err(HandlerError::mismatch(event, self)),
        }

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fans_out_to_each_enabled_target() {
        let handler = DocumentPostedHandler::new(vec!["onec".into(), "kontur".into()]);
        let settings = IntegrationSettings::default()
            .with("onec", true)
            .with("kontur", true);
        let event = Event::from_value(json!({
            "id": "e7",
            "type": "DOCUMENT_POSTED",
            "document_id": "d-100",
            "document_type": "sale"
        }))
        .unwrap();

        let jobs = handler.handle(&event, &settings).await.unwrap();
        let targets: Vec<&str> = jobs.iter().map(|j| j.integration.as_str()).collect();
        assert_eq!(targets, vec!["onec", "kontur"]);
        assert!(jobs.iter().all(|j| j.payload == event.raw));
    }

    #[tokio::test]
    async fn test_no_enabled_targets_yields_no_jobs() {
        let handler = DocumentPostedHandler::new(vec!["onec".into()]);
        let event = Event::from_value(json!({
            "id": "e8",
            "type": "DOCUMENT_POSTED",
            "document_id": 5
        }))
        .unwrap();

        let jobs = handler
            .handle(&event, &IntegrationSettings::default())
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_document_type_creates_jobs() {
        let handler = DocumentPostedHandler::new(vec!["onec".into()]);
        let event = Event::from_value(json!({
            "id": "e9",
            "type": "DOCUMENT_POSTED",
            "document_id": "d-1",
            "document_type": 3
        }))
        .unwrap();

        let jobs = handler
            .handle(&event, &IntegrationSettings::default().with("onec", true))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].payload["document_type"], 3);
    }
}
