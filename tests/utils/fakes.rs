/// In-memory stand-ins for the gateway, repository and cache ports.
///
/// These run the real orchestration code paths without a database, a Redis
/// instance or network access.
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cinesync::modules::cache::CacheGateway;
use cinesync::modules::movie::domain::{MovieRepository, MovieSnapshot, SyncStrategy};
use cinesync::modules::provider::MetadataGateway;
use cinesync::shared::errors::{AppError, AppResult};

/// Gateway fake backed by scripted payloads per source id.
#[derive(Default)]
pub struct FakeGateway {
    payloads: DashMap<i32, Value>,
    failing: DashMap<i32, String>,
    pub fetch_count: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(self, source_id: i32, payload: Value) -> Self {
        self.payloads.insert(source_id, payload);
        self
    }

    pub fn with_failure(self, source_id: i32, reason: &str) -> Self {
        self.failing.insert(source_id, reason.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataGateway for FakeGateway {
    async fn fetch_movie(&self, source_id: i32, _language: &str) -> AppResult<Value> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failing.get(&source_id) {
            return Err(AppError::Network(reason.clone()));
        }
        self.payloads
            .get(&source_id)
            .map(|payload| payload.clone())
            .ok_or_else(|| AppError::Upstream {
                status: 404,
                message: format!("movie {} not found upstream", source_id),
            })
    }

    async fn search_movies(&self, _query: &str, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }

    async fn popular(&self, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }

    async fn trending(&self, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }
}

/// Gateway double that panics on fetch, for worker crash handling tests.
pub struct PanickingGateway;

#[async_trait]
impl MetadataGateway for PanickingGateway {
    async fn fetch_movie(&self, source_id: i32, _language: &str) -> AppResult<Value> {
        panic!("gateway blew up fetching movie {}", source_id);
    }

    async fn search_movies(&self, _query: &str, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }

    async fn popular(&self, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }

    async fn trending(&self, _page: u32, _language: &str) -> AppResult<Value> {
        Ok(Value::Array(vec![]))
    }
}

/// Repository fake holding snapshots in a concurrent map.
///
/// Models the skip-write rule the real store applies: when the incoming
/// snapshot matches the stored `(source_hash, source_updated_at)`, only
/// `synced_at` advances and no content or relation write is counted.
#[derive(Default)]
pub struct FakeRepository {
    store: DashMap<i32, MovieSnapshot>,
    fail_writes: AtomicBool,
    pub persist_count: AtomicUsize,
    pub content_write_count: AtomicUsize,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a store outage.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn seed(&self, snapshot: MovieSnapshot) {
        self.store.insert(snapshot.source_id, snapshot);
    }

    pub fn stored(&self, source_id: i32) -> Option<MovieSnapshot> {
        self.store.get(&source_id).map(|s| s.clone())
    }

    pub fn persists(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    /// Writes that actually replaced content and relations, skip-writes
    /// excluded.
    pub fn content_writes(&self) -> usize {
        self.content_write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MovieRepository for FakeRepository {
    async fn find_by_source_id(&self, source_id: i32) -> AppResult<Option<MovieSnapshot>> {
        Ok(self.store.get(&source_id).map(|s| s.clone()))
    }

    async fn persist(
        &self,
        snapshot: &MovieSnapshot,
        _strategy: SyncStrategy,
    ) -> AppResult<MovieSnapshot> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("store unavailable".to_string()));
        }
        self.persist_count.fetch_add(1, Ordering::SeqCst);

        // Clone out before writing so no map guard is held across the insert
        let existing = self.store.get(&snapshot.source_id).map(|s| s.clone());
        if let Some(existing) = existing {
            if snapshot.matches_stored(&existing.source_hash, existing.source_updated_at) {
                let mut unchanged = existing;
                unchanged.synced_at = snapshot.advanced_synced_at(unchanged.synced_at);
                self.store.insert(snapshot.source_id, unchanged.clone());
                return Ok(unchanged);
            }
        }

        self.content_write_count.fetch_add(1, Ordering::SeqCst);
        self.store.insert(snapshot.source_id, snapshot.clone());
        Ok(snapshot.clone())
    }

    async fn persist_many(
        &self,
        snapshots: &[MovieSnapshot],
        strategy: SyncStrategy,
        _chunk_size: usize,
    ) -> AppResult<Vec<MovieSnapshot>> {
        let mut persisted = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            persisted.push(self.persist(snapshot, strategy).await?);
        }
        Ok(persisted)
    }
}

/// Simple cache fake; a failing variant is available for fault tests.
#[derive(Default)]
pub struct FakeCache {
    entries: DashMap<String, Value>,
    fail: AtomicBool,
    pub set_count: AtomicUsize,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let cache = Self::default();
        cache.fail.store(true, Ordering::SeqCst);
        cache
    }

    pub fn seed(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn entry(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|v| v.clone())
    }

    pub fn sets(&self) -> usize {
        self.set_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("cache unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheGateway for FakeCache {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.check()?;
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &Value, _ttl_secs: u64) -> AppResult<()> {
        self.check()?;
        self.set_count.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn reset(&self) -> AppResult<()> {
        self.entries.clear();
        Ok(())
    }
}
