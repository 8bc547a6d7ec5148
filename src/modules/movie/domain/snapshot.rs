use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relation-sync mode used by the diff/upsert engine.
///
/// `Single` replaces the full genre/keyword association set; `Batch` computes
/// the symmetric difference and only writes additions and removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    Single,
    Batch,
}

/// Immutable representation of a movie's known state at a point in time.
///
/// Created by the snapshot builder from a raw source payload; persisted and
/// mutated only by the repository. The raw payload is carried for storage but
/// stripped before the snapshot enters the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSnapshot {
    pub source_id: i32,
    pub title: String,
    pub original_title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub original_language: Option<String>,
    pub origin_country: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f32>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<i32>,
    /// Local fetch timestamp; monotonically non-decreasing per movie.
    pub synced_at: DateTime<Utc>,
    /// Upstream modification timestamp, when the source exposes one.
    pub source_updated_at: Option<DateTime<Utc>>,
    /// Deterministic digest of the canonicalized source payload.
    pub source_hash: String,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<serde_json::Value>,
}

impl MovieSnapshot {
    /// Copy of the snapshot without the raw payload, suitable for caching.
    pub fn stripped(&self) -> Self {
        Self {
            raw_payload: None,
            ..self.clone()
        }
    }

    /// True when the stored digest and upstream timestamp both match, meaning
    /// the upstream content has not changed since the stored row was written.
    /// Persistence skips every content and relation write in that case and
    /// only advances `synced_at`.
    pub fn matches_stored(
        &self,
        stored_hash: &str,
        stored_updated_at: Option<DateTime<Utc>>,
    ) -> bool {
        self.source_hash == stored_hash && self.source_updated_at == stored_updated_at
    }

    /// The `synced_at` value to write: never regresses below the stored one,
    /// even when a slower fetch commits after a newer one.
    pub fn advanced_synced_at(&self, stored_synced_at: DateTime<Utc>) -> DateTime<Utc> {
        self.synced_at.max(stored_synced_at)
    }
}

/// A single movie sync request: which movie, in which language, and how long
/// the resulting cache entry should live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommand {
    pub source_id: i32,
    pub language: String,
    pub cache_ttl_secs: u64,
}

impl SyncCommand {
    pub fn new(source_id: i32, language: impl Into<String>, cache_ttl_secs: u64) -> Self {
        Self {
            source_id,
            language: language.into(),
            cache_ttl_secs,
        }
    }
}
