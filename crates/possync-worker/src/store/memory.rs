//! In-memory stores for tests and embedding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use possync_core::error::AppError;
use possync_core::result::AppResult;
use possync_entity::{Event, IntegrationSettings, Job, WorkerState};

use super::{EventLog, JobStore, SettingsProvider, StateStore};

/// Event log held in memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn read_events(&self) -> AppResult<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

/// Worker state held in memory, optionally failing every save.
#[derive(Debug)]
pub struct MemoryStateStore {
    state: Mutex<WorkerState>,
    max_retained: usize,
    fail_saves: AtomicBool,
}

impl MemoryStateStore {
    /// Create an empty store keeping at most `max_retained` ids.
    pub fn new(max_retained: usize) -> Self {
        Self {
            state: Mutex::new(WorkerState::default()),
            max_retained,
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The last successfully saved state.
    pub fn snapshot(&self) -> WorkerState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> WorkerState {
        self.snapshot()
    }

    async fn save(&self, state: &WorkerState) -> AppResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::storage("state store is read-only"));
        }
        let mut state = state.clone();
        state.trim_to(self.max_retained);
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        Ok(())
    }
}

/// Job table held in memory.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<Job>>,
    writes: Mutex<usize>,
}

impl MemoryJobStore {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of whole-table rewrites so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn append_job(&self, job: &Job) -> AppResult<()> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(job.clone());
        Ok(())
    }

    async fn read_jobs(&self) -> AppResult<Vec<Job>> {
        Ok(self.snapshot())
    }

    async fn write_jobs(&self, jobs: &[Job]) -> AppResult<()> {
        *self.jobs.lock().unwrap_or_else(|e| e.into_inner()) = jobs.to_vec();
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

/// Settings that can be swapped between ticks.
#[derive(Debug, Default)]
pub struct StaticSettings {
    settings: Mutex<IntegrationSettings>,
}

impl StaticSettings {
    /// Start from the given settings.
    pub fn new(settings: IntegrationSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    /// Replace the settings.
    pub fn set(&self, settings: IntegrationSettings) {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = settings;
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn load(&self) -> AppResult<IntegrationSettings> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
