/// Domain entities for asynchronous import jobs.
///
/// A job tracks one batch synchronization run from submission to its terminal
/// state. Records live in process memory only and do not survive a restart.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::movie::domain::MovieSnapshot;
use crate::modules::sync::{SyncFailure, SyncProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// Full job record as held by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub source_ids: Vec<i32>,
    pub language: String,
    pub progress: SyncProgress,
    pub failures: Vec<SyncFailure>,
    pub snapshots: Vec<MovieSnapshot>,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ImportJob {
    pub fn new(source_ids: Vec<i32>, language: String) -> Self {
        let total = source_ids.len();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            source_ids,
            language,
            progress: SyncProgress {
                total,
                ..SyncProgress::default()
            },
            failures: Vec::new(),
            snapshots: Vec::new(),
            requested_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            status: self.status,
            total: self.progress.total,
            processed: self.progress.processed,
            succeeded: self.progress.succeeded,
            failed: self.progress.failed,
            requested_at: self.requested_at,
            completed_at: self.completed_at,
        }
    }
}

/// Lightweight view for status polling, without snapshots or failure details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
