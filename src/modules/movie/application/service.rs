//! Read path for movie metadata.
//!
//! Resolution order: cache, then store, then a live sync against the source.
//! A stale store hit is served immediately while a background resync brings
//! the record up to date.

use chrono::{Duration, Utc};
use log::{debug, warn};
use std::sync::Arc;

use crate::modules::cache::{movie_cache_key, CacheGateway};
use crate::modules::movie::domain::{
    validate_source_id, MovieRepository, MovieSnapshot, SyncStrategy,
};
use crate::modules::sync::SyncService;
use crate::shared::errors::AppResult;

pub struct MovieService {
    repository: Arc<dyn MovieRepository>,
    cache: Arc<dyn CacheGateway>,
    sync: Arc<SyncService>,
    staleness_threshold: Duration,
    default_cache_ttl_secs: u64,
}

impl MovieService {
    pub fn new(
        repository: Arc<dyn MovieRepository>,
        cache: Arc<dyn CacheGateway>,
        sync: Arc<SyncService>,
        staleness_threshold_days: i64,
        default_cache_ttl_secs: u64,
    ) -> Self {
        Self {
            repository,
            cache,
            sync,
            staleness_threshold: Duration::days(staleness_threshold_days),
            default_cache_ttl_secs,
        }
    }

    /// Get a movie, syncing from the source only when nothing local exists.
    ///
    /// Stale local records are returned as-is; the refresh happens in the
    /// background and its failures are logged, never surfaced to the reader.
    pub async fn get_movie(&self, source_id: i32, language: &str) -> AppResult<MovieSnapshot> {
        validate_source_id(source_id)?;

        let key = movie_cache_key(source_id, language);
        match self.cache.get(&key).await {
            Ok(Some(value)) => {
                if let Ok(snapshot) = serde_json::from_value::<MovieSnapshot>(value) {
                    debug!("serving movie {} from cache", source_id);
                    return Ok(snapshot);
                }
                // Unreadable entry, fall through and repopulate
                let _ = self.cache.del(&key).await;
            }
            Ok(None) => {}
            Err(e) => warn!("cache read for movie {} failed: {}", source_id, e),
        }

        if let Some(snapshot) = self.repository.find_by_source_id(source_id).await? {
            let age = Utc::now() - snapshot.synced_at;
            if age > self.staleness_threshold {
                debug!(
                    "movie {} is stale ({} days old), refreshing in background",
                    source_id,
                    age.num_days()
                );
                self.spawn_background_resync(source_id, language);
            }

            self.populate_cache(&snapshot, &key).await;
            return Ok(snapshot);
        }

        // Nothing local: the reader waits for a full sync
        self.sync
            .sync_movie(
                source_id,
                language,
                self.default_cache_ttl_secs,
                SyncStrategy::Single,
            )
            .await
    }

    fn spawn_background_resync(&self, source_id: i32, language: &str) {
        let sync = Arc::clone(&self.sync);
        let language = language.to_string();
        let ttl = self.default_cache_ttl_secs;

        tokio::spawn(async move {
            if let Err(e) = sync
                .sync_movie(source_id, &language, ttl, SyncStrategy::Single)
                .await
            {
                warn!("background resync of movie {} failed: {}", source_id, e);
            }
        });
    }

    async fn populate_cache(&self, snapshot: &MovieSnapshot, key: &str) {
        match serde_json::to_value(snapshot.stripped()) {
            Ok(value) => {
                if let Err(e) = self
                    .cache
                    .set(key, &value, self.default_cache_ttl_secs)
                    .await
                {
                    warn!("failed to cache movie {}: {}", snapshot.source_id, e);
                }
            }
            Err(e) => warn!(
                "failed to serialize movie {} for caching: {}",
                snapshot.source_id, e
            ),
        }
    }
}
