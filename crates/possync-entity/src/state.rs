//! Persisted worker state.

use serde::{Deserialize, Serialize};

/// Processed event ids, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerState {
    /// Ids in the order they were processed.
    #[serde(default)]
    pub processed_event_ids: Vec<String>,
}

impl WorkerState {
    /// Keep only the `max` most recently processed ids.
    pub fn trim_to(&mut self, max: usize) {
        let len = self.processed_event_ids.len();
        if len > max {
            self.processed_event_ids.drain(..len - max);
        }
    }
}
