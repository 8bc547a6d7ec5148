//! Sync orchestrator: fetch from the source, build a snapshot, persist it and
//! refresh the cache.
//!
//! Single sync is fail-fast and returns the persisted snapshot. Batch sync
//! never fails as a whole: items fail individually, chunks persist in their
//! own transactions, and progress is reported as items reach terminal states.

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::modules::cache::{movie_cache_key, CacheGateway};
use crate::modules::movie::domain::{
    build_snapshot, validate_source_id, MovieRepository, MovieSnapshot, SyncCommand, SyncStrategy,
};
use crate::modules::provider::MetadataGateway;
use crate::shared::errors::AppResult;

use super::types::{SyncFailure, SyncManyOptions, SyncOutcome, SyncProgress};

pub struct SyncService {
    gateway: Arc<dyn MetadataGateway>,
    repository: Arc<dyn MovieRepository>,
    cache: Arc<dyn CacheGateway>,
}

impl SyncService {
    pub fn new(
        gateway: Arc<dyn MetadataGateway>,
        repository: Arc<dyn MovieRepository>,
        cache: Arc<dyn CacheGateway>,
    ) -> Self {
        Self {
            gateway,
            repository,
            cache,
        }
    }

    /// Synchronize one movie and return the state the store holds afterwards.
    pub async fn sync_movie(
        &self,
        source_id: i32,
        language: &str,
        cache_ttl_secs: u64,
        strategy: SyncStrategy,
    ) -> AppResult<MovieSnapshot> {
        validate_source_id(source_id)?;

        let raw = self.gateway.fetch_movie(source_id, language).await?;
        let snapshot = build_snapshot(source_id, raw, Utc::now())?;
        let persisted = self.repository.persist(&snapshot, strategy).await?;

        self.refresh_cache(&persisted, language, cache_ttl_secs)
            .await;

        info!("synchronized movie {} ({})", source_id, persisted.title);
        Ok(persisted)
    }

    /// Synchronize a batch of movies with bounded concurrency.
    ///
    /// Fetch/build runs concurrently up to the configured limit; persistence
    /// happens per chunk in a single transaction. A failed chunk fails every
    /// item in it with the same reason, then the batch continues.
    pub async fn sync_many(
        &self,
        commands: &[SyncCommand],
        options: &SyncManyOptions,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let mut progress = SyncProgress {
            total: commands.len(),
            ..SyncProgress::default()
        };

        if commands.is_empty() {
            return outcome;
        }

        let semaphore = Arc::new(Semaphore::new(options.concurrency_limit.max(1)));
        let chunk_size = options.chunk_size.max(1);

        for chunk in commands.chunks(chunk_size) {
            let mut built: Vec<MovieSnapshot> = Vec::with_capacity(chunk.len());
            let mut commands_by_id: HashMap<i32, &SyncCommand> = HashMap::new();

            let mut workers = FuturesUnordered::new();
            for command in chunk {
                commands_by_id.insert(command.source_id, command);
                workers.push(self.fetch_and_build(command, Arc::clone(&semaphore)));
            }

            // Fetch failures are terminal immediately; built items stay
            // pending until the chunk's persistence outcome is known
            while let Some((source_id, result)) = workers.next().await {
                match result {
                    Ok(snapshot) => built.push(snapshot),
                    Err(e) => {
                        warn!("sync of movie {} failed: {}", source_id, e);
                        outcome.failures.push(SyncFailure {
                            source_id,
                            reason: e.to_string(),
                        });
                        Self::emit_progress(&mut progress, options, source_id, false);
                    }
                }
            }

            if built.is_empty() {
                continue;
            }

            match self
                .repository
                .persist_many(&built, options.strategy, chunk.len())
                .await
            {
                Ok(persisted) => {
                    for snapshot in persisted {
                        if let Some(command) = commands_by_id.get(&snapshot.source_id) {
                            self.refresh_cache(
                                &snapshot,
                                &command.language,
                                command.cache_ttl_secs,
                            )
                            .await;
                        }
                        Self::emit_progress(&mut progress, options, snapshot.source_id, true);
                        outcome.snapshots.push(snapshot);
                    }
                }
                Err(e) => {
                    // Chunk-level failure: attribute the same reason to every
                    // item that was waiting on this transaction
                    warn!(
                        "persisting chunk of {} movies failed: {}",
                        built.len(),
                        e
                    );
                    let reason = e.to_string();
                    for snapshot in &built {
                        outcome.failures.push(SyncFailure {
                            source_id: snapshot.source_id,
                            reason: reason.clone(),
                        });
                        Self::emit_progress(&mut progress, options, snapshot.source_id, false);
                    }
                }
            }
        }

        info!(
            "batch sync finished: {} succeeded, {} failed of {}",
            progress.succeeded, progress.failed, progress.total
        );
        outcome
    }

    async fn fetch_and_build(
        &self,
        command: &SyncCommand,
        semaphore: Arc<Semaphore>,
    ) -> (i32, AppResult<MovieSnapshot>) {
        let source_id = command.source_id;

        let result = async {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| {
                    crate::shared::errors::AppError::Internal(
                        "sync worker pool closed".to_string(),
                    )
                })?;

            validate_source_id(source_id)?;
            let raw = self.gateway.fetch_movie(source_id, &command.language).await?;
            build_snapshot(source_id, raw, Utc::now())
        }
        .await;

        (source_id, result)
    }

    /// Best effort: a cache write failure is logged, never surfaced.
    async fn refresh_cache(&self, snapshot: &MovieSnapshot, language: &str, ttl_secs: u64) {
        let key = movie_cache_key(snapshot.source_id, language);

        match serde_json::to_value(snapshot.stripped()) {
            Ok(value) => {
                if let Err(e) = self.cache.set(&key, &value, ttl_secs).await {
                    warn!("failed to cache movie {}: {}", snapshot.source_id, e);
                } else {
                    debug!("cached movie under {} for {}s", key, ttl_secs);
                }
            }
            Err(e) => warn!(
                "failed to serialize movie {} for caching: {}",
                snapshot.source_id, e
            ),
        }
    }

    fn emit_progress(
        progress: &mut SyncProgress,
        options: &SyncManyOptions,
        source_id: i32,
        succeeded: bool,
    ) {
        progress.processed += 1;
        if succeeded {
            progress.succeeded += 1;
        } else {
            progress.failed += 1;
        }
        progress.last_source_id = Some(source_id);

        if let Some(callback) = &options.on_progress {
            callback(progress);
        }
    }
}
