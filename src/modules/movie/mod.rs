pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::MovieService;
pub use domain::{MovieRepository, MovieSnapshot, SyncCommand, SyncStrategy};
pub use infrastructure::MovieRepositoryImpl;
