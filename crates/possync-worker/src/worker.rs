//! The integration worker: one tick turns new events into jobs and
//! drains a batch of queued jobs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use possync_core::config::worker::WorkerConfig;
use possync_core::config::AppConfig;
use possync_entity::{Event, IntegrationSettings};

use crate::dedup::DedupTracker;
use crate::dispatcher::{Dispatcher, Transport};
use crate::handlers::{HandlerError, HandlerRegistry};
use crate::outbox::OutboxTransport;
use crate::queue::{JobQueue, QueuePolicy, QueueTickReport};
use crate::store::{
    EventLog, FileEventLog, FileJobStore, FileSettingsProvider, FileStateStore, JobStore,
    SettingsProvider, StateStore,
};

/// The collaborators a worker reads from and writes to.
#[derive(Debug, Clone)]
pub struct WorkerStores {
    /// Append-only event log.
    pub events: Arc<dyn EventLog>,
    /// Processed-id persistence.
    pub state: Arc<dyn StateStore>,
    /// Job table.
    pub jobs: Arc<dyn JobStore>,
    /// Integration settings.
    pub settings: Arc<dyn SettingsProvider>,
}

impl WorkerStores {
    /// File-backed stores at the configured paths.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            events: Arc::new(FileEventLog::new(&config.paths.events_log)),
            state: Arc::new(FileStateStore::new(
                &config.paths.state_file,
                config.worker.max_retained_event_ids,
            )),
            jobs: Arc::new(FileJobStore::new(&config.paths.jobs_file)),
            settings: Arc::new(FileSettingsProvider::new(&config.paths.settings_file)),
        }
    }
}

/// Event-side counts of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTickReport {
    /// Unprocessed events seen.
    pub seen: usize,
    /// Events recorded as processed.
    pub processed: usize,
    /// Events whose type has no handler.
    pub ignored: usize,
    /// Events left for the next tick.
    pub failed: usize,
    /// Jobs appended.
    pub jobs_created: usize,
}

/// Counts of one full tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Event phase.
    pub events: EventTickReport,
    /// Queue phase.
    pub jobs: QueueTickReport,
    /// The tick was skipped because settings could not be read.
    pub skipped: bool,
}

/// Why an event stayed unprocessed.
#[derive(Debug, thiserror::Error)]
enum EventError {
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error("Failed to append job: {0}")]
    Append(possync_core::error::AppError),
}

/// Single-owner integration worker.
#[derive(Debug)]
pub struct Worker {
    /// Event log
    events: Arc<dyn EventLog>,
    /// Processed-id persistence
    state: Arc<dyn StateStore>,
    /// Integration settings
    settings: Arc<dyn SettingsProvider>,
    /// Job queue
    queue: JobQueue,
    /// Event handlers
    handlers: HandlerRegistry,
    /// Processed event ids
    tracker: DedupTracker,
    /// Worker configuration
    config: WorkerConfig,
}

impl Worker {
    /// Assemble a worker from explicit collaborators.
    pub fn new(
        stores: WorkerStores,
        transport: Arc<dyn Transport>,
        handlers: HandlerRegistry,
        config: WorkerConfig,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            transport,
            Duration::from_secs(config.dispatch_timeout_seconds),
        ));
        let queue = JobQueue::new(stores.jobs, dispatcher, QueuePolicy::from(&config));

        Self {
            events: stores.events,
            state: stores.state,
            settings: stores.settings,
            queue,
            handlers,
            tracker: DedupTracker::new(config.max_retained_event_ids),
            config,
        }
    }

    /// File-backed worker delivering into the configured outbox.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            WorkerStores::from_config(config),
            Arc::new(OutboxTransport::new(&config.paths.outbox_dir)),
            HandlerRegistry::from_routing(&config.routing),
            config.worker.clone(),
        )
    }

    /// Load the processed ids persisted by a previous run.
    pub async fn load_state(&mut self) {
        let state = self.state.load().await;
        self.tracker = DedupTracker::from_state(&state, self.config.max_retained_event_ids);
        tracing::info!("Loaded {} processed event id(s)", self.tracker.len());
    }

    /// Processed-id tracker.
    pub fn tracker(&self) -> &DedupTracker {
        &self.tracker
    }

    /// Job queue.
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// The most recent unprocessed events, oldest first.
    ///
    /// An unreadable log is treated as empty.
    pub async fn unprocessed_events(&self) -> Vec<Event> {
        let events = match self.events.read_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Event log unreadable, treating as empty: {}", e);
                return Vec::new();
            }
        };

        self.tracker.unprocessed(events, self.config.event_window)
    }

    /// Run one tick: new events first, then queued jobs.
    ///
    /// Jobs created from this tick's events are delivered on the next tick.
    pub async fn tick(&mut self) -> TickReport {
        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Skipping tick, integration settings unavailable: {}", e);
                return TickReport {
                    skipped: true,
                    ..TickReport::default()
                };
            }
        };

        let (events, created) = self.process_events(&settings).await;

        let jobs = match self.queue.process_queued_except(&settings, &created).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Job queue pass failed: {}", e);
                QueueTickReport::default()
            }
        };

        if events.seen > 0 || jobs.processed > 0 {
            tracing::info!(
                "Tick: events seen={} processed={} ignored={} failed={} jobs_created={}; jobs processed={} completed={} retried={} failed={}",
                events.seen,
                events.processed,
                events.ignored,
                events.failed,
                events.jobs_created,
                jobs.processed,
                jobs.completed,
                jobs.retried,
                jobs.failed
            );
        }

        TickReport {
            events,
            jobs,
            skipped: false,
        }
    }

    /// Handle every unprocessed event in chronological order.
    ///
    /// Returns the counts and the ids of the jobs created.
    async fn process_events(
        &mut self,
        settings: &IntegrationSettings,
    ) -> (EventTickReport, HashSet<String>) {
        let events = self.unprocessed_events().await;
        let mut report = EventTickReport {
            seen: events.len(),
            ..EventTickReport::default()
        };
        let mut created = HashSet::new();

        for event in &events {
            match self.process_event(event, settings).await {
                Ok(Some(job_ids)) => {
                    report.jobs_created += job_ids.len();
                    report.processed += 1;
                    created.extend(job_ids);
                }
                Ok(None) => {
                    tracing::warn!(
                        "Ignoring event {} of unknown type '{}'",
                        event.id,
                        event.event_type
                    );
                    report.ignored += 1;
                    report.processed += 1;
                }
                Err(e) => {
                    tracing::error!("Event {} failed, will retry next tick: {}", event.id, e);
                    report.failed += 1;
                    continue;
                }
            }

            self.mark_processed(&event.id).await;
        }

        (report, created)
    }

    /// Run the handler for one event and append its jobs.
    ///
    /// Returns the new job ids; `Ok(None)` means the event type is unknown.
    async fn process_event(
        &self,
        event: &Event,
        settings: &IntegrationSettings,
    ) -> Result<Option<Vec<String>>, EventError> {
        let Some(jobs) = self.handlers.handle(event, settings).await? else {
            return Ok(None);
        };

        for job in &jobs {
            self.queue.enqueue(job).await.map_err(EventError::Append)?;
        }

        Ok(Some(jobs.into_iter().map(|job| job.job_id).collect()))
    }

    /// Record an id and persist immediately; persistence errors are logged.
    async fn mark_processed(&mut self, id: &str) {
        self.tracker.record(id);
        if let Err(e) = self.state.save(&self.tracker.to_state()).await {
            tracing::warn!("Failed to persist worker state after event {}: {}", id, e);
        }
    }
}
