pub mod builder;
pub mod repository;
pub mod snapshot;

pub use builder::{build_snapshot, content_hash, dedup_names, relation_diff, validate_source_id};
pub use repository::MovieRepository;
pub use snapshot::{MovieSnapshot, SyncCommand, SyncStrategy};
