//! Event type to integration routing.

use serde::{Deserialize, Serialize};

/// Integrations that receive a job for each known event type.
///
/// Only integrations enabled in the settings file at the time the event
/// is handled get a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Targets for `DOCUMENT_POSTED`.
    #[serde(default = "default_document_posted")]
    pub document_posted: Vec<String>,
    /// Targets for `STOCK_CHANGED`.
    #[serde(default = "default_stock_changed")]
    pub stock_changed: Vec<String>,
    /// Targets for `PRODUCT_UPDATED`.
    #[serde(default = "default_product_updated")]
    pub product_updated: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            document_posted: default_document_posted(),
            stock_changed: default_stock_changed(),
            product_updated: default_product_updated(),
        }
    }
}

fn default_document_posted() -> Vec<String> {
    vec!["onec".to_string(), "kontur".to_string()]
}

fn default_stock_changed() -> Vec<String> {
    vec!["onec".to_string(), "rkeeper".to_string()]
}

fn default_product_updated() -> Vec<String> {
    vec!["onec".to_string(), "rkeeper".to_string()]
}
