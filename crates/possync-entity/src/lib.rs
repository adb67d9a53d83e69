//! # possync-entity
//!
//! Data model for the integration worker. Every struct in this crate is
//! either a line of one of the NDJSON files (events, jobs) or the content
//! of one of the JSON documents (worker state, integration settings).
//! All entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`.

pub mod event;
pub mod job;
pub mod settings;
pub mod state;

pub use event::{Event, EventPayload};
pub use job::{Job, JobStatus};
pub use settings::{IntegrationConfig, IntegrationSettings};
pub use state::WorkerState;
