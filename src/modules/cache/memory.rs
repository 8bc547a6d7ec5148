//! In-process cache adapter backed by a concurrent map.
//!
//! Expired entries are dropped opportunistically on read; a background sweep
//! task removes the rest so abandoned keys do not accumulate.

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::shared::errors::AppResult;

use super::gateway::CacheGateway;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

pub struct MemoryCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    sweep_task_started: Arc<AtomicBool>,
    sweep_interval: Duration,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_sweep_interval(Duration::from_secs(300))
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        let cache = Self {
            entries: Arc::new(DashMap::new()),
            sweep_task_started: Arc::new(AtomicBool::new(false)),
            sweep_interval,
        };

        // The sweep needs a runtime; outside one it starts lazily on first use
        if tokio::runtime::Handle::try_current().is_ok() {
            cache.ensure_sweep_task_started();
        }

        cache
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_sweep_task_started(&self) {
        if self
            .sweep_task_started
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let entries = Arc::clone(&self.entries);
        let sweep_interval = self.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);

            loop {
                interval.tick().await;

                let expired: Vec<String> = entries
                    .iter()
                    .filter(|entry| entry.value().is_expired())
                    .map(|entry| entry.key().clone())
                    .collect();

                let count = expired.len();
                for key in expired {
                    entries.remove(&key);
                }

                if count > 0 {
                    debug!("swept {} expired cache entries", count);
                }
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheGateway for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.ensure_sweep_task_started();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                debug!("cache hit for key {}", key);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        // Read guard is released above, safe to remove now
        if expired {
            self.entries.remove(key);
            debug!("removed expired cache entry for key {}", key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> AppResult<()> {
        self.ensure_sweep_task_started();
        self.entries.insert(
            key.to_string(),
            CacheEntry::new(value.clone(), Duration::from_secs(ttl_secs)),
        );
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
