/// Registry interface for import job records.
///
/// Implementations are in-process; job state is volatile by design and a
/// restart forgets all of it.
use crate::modules::sync::{SyncOutcome, SyncProgress};
use uuid::Uuid;

use super::entities::ImportJob;

pub trait JobRegistry: Send + Sync {
    /// Register a new job record.
    fn create(&self, job: ImportJob);

    /// Snapshot of a job's current state, if it exists.
    fn get(&self, job_id: Uuid) -> Option<ImportJob>;

    fn mark_running(&self, job_id: Uuid);

    /// Update the running counters after an item reached a terminal state.
    fn record_progress(&self, job_id: Uuid, progress: &SyncProgress);

    /// Move the job to `Completed` and attach the batch outcome.
    fn complete(&self, job_id: Uuid, outcome: SyncOutcome);

    /// Move the job to `Failed` with a terminal error.
    fn fail(&self, job_id: Uuid, error: String);
}
