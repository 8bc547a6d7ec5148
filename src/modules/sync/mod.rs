pub mod service;
pub mod types;

pub use service::SyncService;
pub use types::{ProgressCallback, SyncFailure, SyncManyOptions, SyncOutcome, SyncProgress};
