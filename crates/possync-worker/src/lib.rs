//! Integration worker for possync.
//!
//! This crate provides:
//! - File-backed and in-memory stores for the event log, worker state,
//!   job queue and integration settings
//! - A bounded dedup tracker over processed event ids
//! - Event handlers that turn events into integration jobs
//! - A dispatcher with an outbox transport that delivers jobs
//! - The worker tick and the runner loop that drives it

pub mod dedup;
pub mod dispatcher;
pub mod handlers;
pub mod outbox;
pub mod queue;
pub mod runner;
pub mod store;
pub mod worker;

pub use runner::WorkerRunner;
pub use worker::Worker;
