//! Event handlers: turn events into integration jobs.
//!
//! One handler per event type. A handler's only effect is the list of
//! jobs it returns; the worker appends them to the queue and records the
//! event as processed only when every append succeeded.

pub mod document;
pub mod product;
pub mod stock;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use possync_core::config::routing::RoutingConfig;
use possync_core::error::AppError;
use possync_entity::{Event, IntegrationSettings, Job};

pub use document::DocumentPostedHandler;
pub use product::ProductUpdatedHandler;
pub use stock::StockChangedHandler;

/// Trait for event handler implementations
#[async_trait]
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Get the event type this handler processes
    fn event_type(&self) -> &str;

    /// Build the jobs for one event
    async fn handle(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Vec<Job>, HandlerError>;
}

/// Error from handling an event. The event stays unprocessed.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The registry routed an event to a handler for another type.
    #[error("Event {id} of type '{event_type}' reached the '{handler}' handler")]
    PayloadMismatch {
        /// Event id.
        id: String,
        /// Event type.
        event_type: String,
        /// Handler type.
        handler: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl HandlerError {
    pub(crate) fn mismatch(event: &Event, handler: &dyn EventHandler) -> Self {
        Self::PayloadMismatch {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            handler: handler.event_type().to_string(),
        }
    }
}

/// Dispatches events to the appropriate handler based on the event type
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    /// Registered handlers by event type
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers routed per configuration
    pub fn from_routing(routing: &RoutingConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocumentPostedHandler::new(
            routing.document_posted.clone(),
        )));
        registry.register(Arc::new(StockChangedHandler::new(
            routing.stock_changed.clone(),
        )));
        registry.register(Arc::new(ProductUpdatedHandler::new(
            routing.product_updated.clone(),
        )));
        registry
    }

    /// Register an event handler
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let event_type = handler.event_type().to_string();
        tracing::debug!("Registered event handler for type '{}'", event_type);
        self.handlers.insert(event_type, handler);
    }

    /// Handle an event. `Ok(None)` means no handler knows its type.
    pub async fn handle(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Option<Vec<Job>>, HandlerError> {
        let Some(handler) = self.handlers.get(&event.event_type) else {
            return Ok(None);
        };

        handler.handle(event, settings).await.map(Some)
    }

    /// Check if a handler is registered for an event type
    pub fn has_handler(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }
}

/// Log an event of a known type whose fields could not be read.
pub(crate) fn log_untyped(event: &Event, jobs: usize) {
    tracing::warn!(
        "Event {} of type '{}' has unexpected fields, forwarding it as-is: {} job(s)",
        event.id,
        event.event_type,
        jobs
    );
}

/// One queued job per enabled integration in `targets`.
pub(crate) fn jobs_for_enabled(
    targets: &[String],
    event: &Event,
    settings: &IntegrationSettings,
) -> Vec<Job> {
    targets
        .iter()
        .filter(|integration| {
            let enabled = settings.is_enabled(integration);
            if !enabled {
                tracing::trace!(
                    "Skipping integration '{}' for event {}: disabled",
                    integration,
                    event.id
                );
            }
            enabled
        })
        .map(|integration| Job::new(integration.clone(), event.event_type.clone(), event.raw.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> Event {
        Event::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_type_has_no_handler() {
        let registry = HandlerRegistry::from_routing(&RoutingConfig::default());
        let settings = IntegrationSettings::default().with("onec", true);
        let result = registry
            .handle(&event(json!({"id": "e1", "type": "TABLE_OPENED"})), &settings)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_routes_to_enabled_integrations_only() {
        let registry = HandlerRegistry::from_routing(&RoutingConfig::default());
        let settings = IntegrationSettings::default()
            .with("onec", true)
            .with("rkeeper", false)
            .with("kontur", true);

        let jobs = registry
            .handle(
                &event(json!({"id": "e1", "type": "STOCK_CHANGED", "product_id": "p1", "new_quantity": 5})),
                &settings,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].integration, "onec");
        assert_eq!(jobs[0].job_type, "STOCK_CHANGED");
        assert_eq!(jobs[0].payload["product_id"], "p1");
    }

    #[test]
    fn test_registered_types() {
        let registry = HandlerRegistry::from_routing(&RoutingConfig::default());
        for event_type in ["DOCUMENT_POSTED", "PRODUCT_UPDATED", "STOCK_CHANGED"] {
            assert!(registry.has_handler(event_type));
        }
        assert!(!registry.has_handler("SHIFT_CLOSED"));
    }
}
