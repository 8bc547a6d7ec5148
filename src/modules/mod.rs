pub mod cache;
pub mod jobs;
pub mod movie;
pub mod provider;
pub mod sync;
