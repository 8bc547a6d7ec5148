use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::modules::movie::domain::{MovieSnapshot, SyncStrategy};

/// Callback invoked after each item reaches a terminal state during a batch.
pub type ProgressCallback = Arc<dyn Fn(&SyncProgress) + Send + Sync>;

/// Options for a batch synchronization run.
#[derive(Clone)]
pub struct SyncManyOptions {
    pub strategy: SyncStrategy,
    /// Upper bound on concurrent fetch/build workers.
    pub concurrency_limit: usize,
    /// Number of items persisted per transaction.
    pub chunk_size: usize,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for SyncManyOptions {
    fn default() -> Self {
        Self {
            strategy: SyncStrategy::Batch,
            concurrency_limit: 5,
            chunk_size: 100,
            on_progress: None,
        }
    }
}

/// Running counters for a batch. `processed == succeeded + failed` holds at
/// every emission, and `processed == total` once the batch finishes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncProgress {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Source id of the item that just reached a terminal state.
    pub last_source_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncFailure {
    pub source_id: i32,
    pub reason: String,
}

/// Result of a batch run. A batch never fails as a whole; per-item failures
/// are collected here instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub snapshots: Vec<MovieSnapshot>,
    pub failures: Vec<SyncFailure>,
}
