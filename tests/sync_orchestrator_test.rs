/// Orchestrator tests over in-memory ports.
///
/// Covers single sync, batch accounting with per-item failures, chunk-level
/// failure attribution and progress reporting.
mod utils;

use std::sync::{Arc, Mutex};

use cinesync::modules::cache::movie_cache_key;
use cinesync::modules::movie::domain::{SyncCommand, SyncStrategy};
use cinesync::modules::sync::{SyncManyOptions, SyncProgress, SyncService};

use utils::factories::movie_payload;
use utils::fakes::{FakeCache, FakeGateway, FakeRepository};

fn commands(ids: &[i32]) -> Vec<SyncCommand> {
    ids.iter()
        .map(|id| SyncCommand::new(*id, "en-US", 3600))
        .collect()
}

#[tokio::test]
async fn single_sync_persists_and_caches() {
    let gateway = Arc::new(FakeGateway::new().with_movie(603, movie_payload(603, "The Matrix")));
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway.clone(), repository.clone(), cache.clone());

    let snapshot = service
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .expect("sync should succeed");

    assert_eq!(snapshot.title, "The Matrix");
    assert_eq!(snapshot.release_year, Some(1999));
    assert!(snapshot.genres.contains(&"Action".to_string()));
    assert!(repository.stored(603).is_some());

    // Cached copy exists and carries no raw payload
    let cached = cache.entry(&movie_cache_key(603, "en-US")).unwrap();
    assert_eq!(cached["title"], "The Matrix");
    assert!(cached.get("raw_payload").is_none());
}

#[tokio::test]
async fn single_sync_rejects_invalid_id() {
    let gateway = Arc::new(FakeGateway::new());
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway.clone(), repository, cache);

    let err = service
        .sync_movie(-1, "en-US", 3600, SyncStrategy::Single)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "validation_error");
    assert_eq!(gateway.fetches(), 0, "invalid id must not reach the source");
}

#[tokio::test]
async fn single_sync_survives_cache_outage() {
    let gateway = Arc::new(FakeGateway::new().with_movie(603, movie_payload(603, "The Matrix")));
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::failing());
    let service = SyncService::new(gateway, repository.clone(), cache);

    let snapshot = service
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .expect("cache failures must not fail the sync");

    assert_eq!(snapshot.title, "The Matrix");
    assert!(repository.stored(603).is_some());
}

#[tokio::test]
async fn repeat_sync_of_unchanged_movie_skips_content_writes() {
    let gateway = Arc::new(FakeGateway::new().with_movie(603, movie_payload(603, "The Matrix")));
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway, repository.clone(), cache);

    let first = service
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .unwrap();
    let second = service
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .unwrap();

    // Identical payload hashes identically, so the second persist only
    // advances synced_at and leaves content and relations untouched
    assert_eq!(second.source_hash, first.source_hash);
    assert_eq!(second.genres, first.genres);
    assert_eq!(second.keywords, first.keywords);
    assert!(second.synced_at >= first.synced_at);

    assert_eq!(repository.persists(), 2);
    assert_eq!(repository.content_writes(), 1);
}

#[tokio::test]
async fn repeat_sync_of_changed_movie_writes_content() {
    let gateway = Arc::new(FakeGateway::new().with_movie(603, movie_payload(603, "The Matrix")));
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway.clone(), repository.clone(), cache.clone());

    service
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .unwrap();

    // Upstream record changes between fetches
    let gateway2 = Arc::new(
        FakeGateway::new().with_movie(603, movie_payload(603, "The Matrix (Remastered)")),
    );
    let service2 = SyncService::new(gateway2, repository.clone(), cache);

    let updated = service2
        .sync_movie(603, "en-US", 3600, SyncStrategy::Single)
        .await
        .unwrap();

    assert_eq!(updated.title, "The Matrix (Remastered)");
    assert_eq!(repository.content_writes(), 2);
    assert_eq!(
        repository.stored(603).unwrap().title,
        "The Matrix (Remastered)"
    );
}

#[tokio::test]
async fn batch_accounts_for_partial_failures() {
    let gateway = Arc::new(
        FakeGateway::new()
            .with_movie(603, movie_payload(603, "The Matrix"))
            .with_movie(604, movie_payload(604, "The Matrix Reloaded")),
    );
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway, repository.clone(), cache);

    let outcome = service
        .sync_many(&commands(&[603, -1, 604]), &SyncManyOptions::default())
        .await;

    assert_eq!(outcome.snapshots.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].source_id, -1);
    assert!(outcome.failures[0].reason.contains("invalid"));

    assert!(repository.stored(603).is_some());
    assert!(repository.stored(604).is_some());
}

#[tokio::test]
async fn batch_attributes_chunk_failure_to_every_item() {
    let gateway = Arc::new(
        FakeGateway::new()
            .with_movie(603, movie_payload(603, "The Matrix"))
            .with_movie(604, movie_payload(604, "The Matrix Reloaded")),
    );
    let repository = Arc::new(FakeRepository::new());
    repository.fail_writes();
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway, repository, cache);

    let outcome = service
        .sync_many(&commands(&[603, 604]), &SyncManyOptions::default())
        .await;

    assert!(outcome.snapshots.is_empty());
    assert_eq!(outcome.failures.len(), 2);
    // Both items carry the same chunk-level reason
    assert_eq!(outcome.failures[0].reason, outcome.failures[1].reason);
    assert!(outcome.failures[0].reason.contains("store unavailable"));
}

#[tokio::test]
async fn batch_progress_counters_reconcile() {
    let gateway = Arc::new(
        FakeGateway::new()
            .with_movie(603, movie_payload(603, "The Matrix"))
            .with_movie(604, movie_payload(604, "The Matrix Reloaded"))
            .with_failure(605, "connection reset"),
    );
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway, repository, cache);

    let emissions: Arc<Mutex<Vec<SyncProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&emissions);

    let options = SyncManyOptions {
        on_progress: Some(Arc::new(move |progress: &SyncProgress| {
            sink.lock().unwrap().push(*progress);
        })),
        ..SyncManyOptions::default()
    };

    let outcome = service.sync_many(&commands(&[603, 604, 605]), &options).await;

    let emissions = emissions.lock().unwrap();
    assert_eq!(emissions.len(), 3, "one emission per terminal item");

    for (i, progress) in emissions.iter().enumerate() {
        assert_eq!(progress.total, 3);
        assert_eq!(progress.processed, i + 1);
        assert_eq!(progress.processed, progress.succeeded + progress.failed);
        assert!(progress.last_source_id.is_some());
    }

    let last = emissions.last().unwrap();
    assert_eq!(last.processed, 3);
    assert_eq!(last.succeeded, 2);
    assert_eq!(last.failed, 1);

    assert_eq!(outcome.snapshots.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].source_id, 605);
}

#[tokio::test]
async fn batch_empty_input_is_a_noop() {
    let gateway = Arc::new(FakeGateway::new());
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway.clone(), repository, cache);

    let outcome = service.sync_many(&[], &SyncManyOptions::default()).await;

    assert!(outcome.snapshots.is_empty());
    assert!(outcome.failures.is_empty());
    assert_eq!(gateway.fetches(), 0);
}

#[tokio::test]
async fn batch_respects_chunking() {
    let gateway = Arc::new(
        FakeGateway::new()
            .with_movie(1, movie_payload(1, "One"))
            .with_movie(2, movie_payload(2, "Two"))
            .with_movie(3, movie_payload(3, "Three")),
    );
    let repository = Arc::new(FakeRepository::new());
    let cache = Arc::new(FakeCache::new());
    let service = SyncService::new(gateway, repository.clone(), cache);

    let options = SyncManyOptions {
        chunk_size: 2,
        concurrency_limit: 2,
        ..SyncManyOptions::default()
    };

    let outcome = service.sync_many(&commands(&[1, 2, 3]), &options).await;

    assert_eq!(outcome.snapshots.len(), 3);
    assert_eq!(repository.persists(), 3);
}
