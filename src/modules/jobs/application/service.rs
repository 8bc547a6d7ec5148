//! Asynchronous import jobs over the batch sync orchestrator.
//!
//! `enqueue` returns a job id immediately; the batch runs on a spawned task
//! and its progress is observable through the registry. Completed jobs retain
//! their outcome until the process exits.

use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::modules::jobs::domain::{ImportJob, JobRegistry, JobSummary};
use crate::modules::movie::domain::{SyncCommand, SyncStrategy};
use crate::modules::sync::{SyncManyOptions, SyncService};
use crate::shared::errors::{AppError, AppResult};

pub struct JobService {
    registry: Arc<dyn JobRegistry>,
    sync: Arc<SyncService>,
    default_cache_ttl_secs: u64,
}

impl JobService {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        sync: Arc<SyncService>,
        default_cache_ttl_secs: u64,
    ) -> Self {
        Self {
            registry,
            sync,
            default_cache_ttl_secs,
        }
    }

    /// Submit a batch import. Duplicate ids are collapsed, order preserved.
    /// Returns once the job record exists; the work itself runs detached.
    pub fn enqueue(&self, source_ids: &[i32], language: &str) -> AppResult<JobSummary> {
        let mut seen = HashSet::new();
        let unique: Vec<i32> = source_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if unique.is_empty() {
            return Err(AppError::Validation(
                "import job requires at least one source id".to_string(),
            ));
        }

        let job = ImportJob::new(unique.clone(), language.to_string());
        let summary = job.summary();
        let job_id = job.id;
        self.registry.create(job);

        info!("enqueued import job {} with {} movies", job_id, unique.len());

        let registry = Arc::clone(&self.registry);
        let sync = Arc::clone(&self.sync);
        let language = language.to_string();
        let cache_ttl_secs = self.default_cache_ttl_secs;

        tokio::spawn(async move {
            registry.mark_running(job_id);

            let commands: Vec<SyncCommand> = unique
                .iter()
                .map(|id| SyncCommand::new(*id, language.clone(), cache_ttl_secs))
                .collect();

            let progress_registry = Arc::clone(&registry);
            let options = SyncManyOptions {
                strategy: SyncStrategy::Batch,
                on_progress: Some(Arc::new(move |progress| {
                    progress_registry.record_progress(job_id, progress);
                })),
                ..SyncManyOptions::default()
            };

            // The batch runs on its own task so a panic anywhere inside it
            // surfaces as a JoinError and the job still reaches a terminal
            // state instead of hanging in Running
            let worker =
                tokio::spawn(async move { sync.sync_many(&commands, &options).await });

            match worker.await {
                Ok(outcome) => {
                    if !outcome.failures.is_empty() {
                        warn!(
                            "import job {} finished with {} failures",
                            job_id,
                            outcome.failures.len()
                        );
                    }
                    registry.complete(job_id, outcome);
                }
                Err(e) => {
                    warn!("import job {} worker crashed: {}", job_id, e);
                    registry.fail(job_id, format!("import worker crashed: {}", e));
                }
            }
        });

        Ok(summary)
    }

    pub fn get_job(&self, job_id: uuid::Uuid) -> AppResult<ImportJob> {
        self.registry
            .get(job_id)
            .ok_or_else(|| AppError::NotFound(format!("import job {} not found", job_id)))
    }

    pub fn get_job_summary(&self, job_id: uuid::Uuid) -> AppResult<JobSummary> {
        self.get_job(job_id).map(|job| job.summary())
    }
}
