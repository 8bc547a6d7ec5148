use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::modules::jobs::domain::{ImportJob, JobRegistry, JobStatus};
use crate::modules::sync::{SyncOutcome, SyncProgress};

/// Concurrent in-memory registry. The map is the single source of truth for
/// job state; readers always get a cloned snapshot.
#[derive(Default)]
pub struct InMemoryJobRegistry {
    jobs: DashMap<Uuid, ImportJob>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn create(&self, job: ImportJob) {
        self.jobs.insert(job.id, job);
    }

    fn get(&self, job_id: Uuid) -> Option<ImportJob> {
        self.jobs.get(&job_id).map(|job| job.clone())
    }

    fn mark_running(&self, job_id: Uuid) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = JobStatus::Running;
        }
    }

    fn record_progress(&self, job_id: Uuid, progress: &SyncProgress) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.progress = *progress;
        }
    }

    fn complete(&self, job_id: Uuid, outcome: SyncOutcome) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = JobStatus::Completed;
            job.snapshots = outcome.snapshots;
            job.failures = outcome.failures;
            job.completed_at = Some(Utc::now());
        }
    }

    fn fail(&self, job_id: Uuid, error: String) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.status = JobStatus::Failed;
            job.error = Some(error);
            job.completed_at = Some(Utc::now());
        }
    }
}
