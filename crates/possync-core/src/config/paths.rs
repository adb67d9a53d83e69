//! File locations shared with the point-of-sale application.

use serde::{Deserialize, Serialize};

/// Paths of the event log, job queue, worker state, settings and outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Append-only NDJSON event log written by the main application.
    #[serde(default = "default_events_log")]
    pub events_log: String,
    /// NDJSON job queue owned by the worker.
    #[serde(default = "default_jobs_file")]
    pub jobs_file: String,
    /// JSON file holding the processed event ids.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// JSON integration settings maintained by the admin UI.
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
    /// Root of the per-integration outbox directories.
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            events_log: default_events_log(),
            jobs_file: default_jobs_file(),
            state_file: default_state_file(),
            settings_file: default_settings_file(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

fn default_events_log() -> String {
    "data/events.ndjson".to_string()
}

fn default_jobs_file() -> String {
    "data/integration_jobs.ndjson".to_string()
}

fn default_state_file() -> String {
    "data/integration_worker_state.json".to_string()
}

fn default_settings_file() -> String {
    "data/integration_settings.json".to_string()
}

fn default_outbox_dir() -> String {
    "data/outbox".to_string()
}
