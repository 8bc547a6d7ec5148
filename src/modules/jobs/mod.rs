pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::JobService;
pub use domain::{ImportJob, JobRegistry, JobStatus, JobSummary};
pub use infrastructure::InMemoryJobRegistry;
