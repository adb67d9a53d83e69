//! `STOCK_CHANGED` handler.

use async_trait::async_trait;

use possync_entity::{Event, EventPayload, IntegrationSettings, Job};

use super::{jobs_for_enabled, log_untyped, EventHandler, HandlerError};

/// Propagates stock levels to the ERP and the restaurant back office
#[derive(Debug)]
pub struct StockChangedHandler {
    /// Integrations that track stock
    targets: Vec<String>,
}

impl StockChangedHandler {
    /// Create a new stock handler
    pub fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl EventHandler for StockChangedHandler {
    fn event_type(&self) -> &str {
        EventPayload::STOCK_CHANGED
    }

    async fn handle(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Vec<Job>, HandlerError> {
        let jobs = jobs_for_enabled(&self.targets, event, settings);

        match &event.payload {
            EventPayload::StockChanged(change) => tracing::info!(
                "Stock of product {} changed to {}: {} job(s)",
                change.product_id,
                change
                    .new_quantity
                    .map_or_else(|| "unknown".to_string(), |q| q.to_string()),
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
    async fn test_mismatched_payload_is_an_error() {
        let handler = StockChangedHandler::new(vec!["onec".into()]);
        let event = Event::from_value(json!({
            "id": "e1",
            "type": "PRODUCT_UPDATED",
            "product_id": "p1"
        }))
        .unwrap();

        let err = handler
            .handle(&event, &IntegrationSettings::default().with("onec", true))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::PayloadMismatch { .. }));
    }

    #[tokio::test]
    async fn test_loose_quantities_still_create_jobs() {
        let handler = StockChangedHandler::new(vec!["onec".into()]);
        let settings = IntegrationSettings::default().with("onec", true);

        for quantity in [json!("5"), json!(null), json!([1, 2])] {
            let event = Event::from_value(json!({
                "id": "e1",
                "type": "STOCK_CHANGED",
                "product_id": "p1",
                "new_quantity": quantity.clone()
            }))
            .unwrap();

            let jobs = handler.handle(&event, &settings).await.unwrap();
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].payload["new_quantity"], quantity);
        }
    }

    #[tokio::test]
    async fn test_untyped_payload_is_routed_by_type() {
        let handler = StockChangedHandler::new(vec!["onec".into()]);
        let event = Event::from_value(json!({
            "id": "e1",
            "type": "STOCK_CHANGED",
            "sku": "p1"
        }))
        .unwrap();
        assert_eq!(event.payload, EventPayload::Untyped);

        let jobs = handler
            .handle(&event, &IntegrationSettings::default().with("onec", true))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, "STOCK_CHANGED");
        assert_eq!(jobs[0].payload["sku"], "p1");
    }
}
