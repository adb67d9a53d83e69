//! JSON worker state file.

use std::path::PathBuf;

use async_trait::async_trait;

use possync_core::result::AppResult;
use possync_entity::WorkerState;

use super::{read_optional, write_atomic, StateStore};

/// Persists processed event ids as `{"processedEventIds": [...]}`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    /// Path of the state file.
    path: PathBuf,
    /// Maximum number of ids written on save.
    max_retained: usize,
}

impl FileStateStore {
    /// Create a store at `path` keeping at most `max_retained` ids.
    pub fn new(path: impl Into<PathBuf>, max_retained: usize) -> Self {
        Self {
            path: path.into(),
            max_retained,
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> WorkerState {
        let content = match read_optional(&self.path).await {
            Ok(Some(content)) => content,
            Ok(None) => return WorkerState::default(),
            Err(e) => {
                tracing::warn!("Worker state unreadable, starting empty: {}", e);
                return WorkerState::default();
            }
        };

        match serde_json::from_slice::<WorkerState>(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Worker state '{}' is corrupt, starting empty: {}",
                    self.path.display(),
                    e
                );
                WorkerState::default()
            }
        }
    }

    async fn save(&self, state: &WorkerState) -> AppResult<()> {
        let mut state = state.clone();
        state.trim_to(self.max_retained);
        let body = serde_json::to_vec_pretty(&state)?;
        write_atomic(&self.path, &body).await
    }
}
