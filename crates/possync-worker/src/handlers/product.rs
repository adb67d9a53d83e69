//! `PRODUCT_UPDATED` handler.

use async_trait::async_trait;

use possync_entity::{Event, EventPayload, IntegrationSettings, Job};

use super::{jobs_for_enabled, log_untyped, EventHandler, HandlerError};

/// Pushes product card edits to the catalog-owning integrations
#[derive(Debug)]
pub struct ProductUpdatedHandler {
    /// Integrations that mirror the product catalog
    targets: Vec<String>,
}

impl ProductUpdatedHandler {
    /// Create a new product handler
    pub fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl EventHandler for ProductUpdatedHandler {
    fn event_type(&self) -> &str {
        EventPayload::PRODUCT_UPDATED
    }

    async fn handle(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Vec<Job>, HandlerError> {
        let jobs = jobs_for_enabled(&self.targets, event, settings);

        match &event.payload {
            EventPayload::ProductUpdated(product) => {
                tracing::info!("Product {} updated: {} job(s)", product.product_id, jobs.len())
            }
            EventPayload::Untyped => log_untyped(event, jobs.len()),
            _ => return Err(HandlerError::mismatch(event, self)),
        }

        Ok(jobs)
    }
}
