pub mod entities;
pub mod registry;

pub use entities::{ImportJob, JobStatus, JobSummary};
pub use registry::JobRegistry;
