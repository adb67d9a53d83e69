//! Integration settings maintained by the admin UI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings of one integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Whether jobs for this integration may be created and delivered.
    #[serde(default)]
    pub enabled: bool,
    /// Connection details; opaque to the worker.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Integration key to settings mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IntegrationSettings {
    integrations: BTreeMap<String, IntegrationConfig>,
}

impl IntegrationSettings {
    /// Interpret a settings document.
    ///
    /// The document must be an object. Entries are read leniently: an
    /// entry that is not an object, or whose `enabled` is not a boolean,
    /// counts as disabled rather than invalidating the whole document.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(entries) = value else {
            return Err("integration settings must be a JSON object".to_string());
        };

        let integrations = entries
            .into_iter()
            .map(|(key, entry)| {
                let config = match entry {
                    Value::Object(mut fields) => {
                        let enabled = fields
                            .remove("enabled")
                            .and_then(|v| v.as_bool())
                            .unwrap_or(false);
                        IntegrationConfig {
                            enabled,
                            extra: fields,
                        }
                    }
                    _ => IntegrationConfig::default(),
                };
                (key, config)
            })
            .collect();

        Ok(Self { integrations })
    }

    /// Add or replace an integration.
    pub fn insert(&mut self, key: impl Into<String>, config: IntegrationConfig) {
        self.integrations.insert(key.into(), config);
    }

    /// Builder-style helper that sets only the `enabled` flag.
    pub fn with(mut self, key: impl Into<String>, enabled: bool) -> Self {
        self.insert(
            key,
            IntegrationConfig {
                enabled,
                extra: Map::new(),
            },
        );
        self
    }

    /// Look up an integration.
    pub fn get(&self, key: &str) -> Option<&IntegrationConfig> {
        self.integrations.get(key)
    }

    /// A missing integration is disabled.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|c| c.enabled)
    }

    /// Iterate integrations in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IntegrationConfig)> {
        self.integrations.iter()
    }

    /// Number of configured integrations.
    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    /// Whether no integration is configured.
    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }
}
