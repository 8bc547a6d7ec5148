use async_trait::async_trait;

use crate::shared::errors::AppResult;

use super::snapshot::{MovieSnapshot, SyncStrategy};

/// Persistence port for the diff/upsert engine.
///
/// Implementations own transaction scope: one transaction per `persist` call,
/// one per sub-chunk in `persist_many`. Returned snapshots are always re-read
/// from the store after commit, so callers see canonical database state.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn find_by_source_id(&self, source_id: i32) -> AppResult<Option<MovieSnapshot>>;

    async fn persist(
        &self,
        snapshot: &MovieSnapshot,
        strategy: SyncStrategy,
    ) -> AppResult<MovieSnapshot>;

    /// Persist a batch, splitting it into sub-transactions of `chunk_size`
    /// movies to bound transaction scope. Results preserve input order.
    async fn persist_many(
        &self,
        snapshots: &[MovieSnapshot],
        strategy: SyncStrategy,
        chunk_size: usize,
    ) -> AppResult<Vec<MovieSnapshot>>;
}
