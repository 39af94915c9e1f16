//! Row views returned by store queries.

use serde::Serialize;

use crate::model::{JobId, JobStatus};

/// One line of `fetchq list`: a job with aggregated file counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub status: JobStatus,
    pub thread_count: u32,
    pub files: u32,
    /// Files finished without an error.
    pub done: u32,
    /// Files finished with an error.
    pub failed: u32,
    /// Sum of `bytes_transferred` across files.
    pub bytes: u64,
    /// Unix seconds.
    pub created_at: i64,
}
