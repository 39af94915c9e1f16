//! State sink: the save contract the engine checkpoints through.
//!
//! Workers never query state back; they only push point-in-time snapshots.
//! Implementations must be safe for concurrent use on distinct jobs/files.
//! Each job or file has exactly one writer at a time, so no cross-entity
//! locking is required.

mod memory;

use std::future::Future;

use crate::model::{Job, JobFile, JobId};

pub use memory::{Checkpoint, MemorySink};

/// Why a checkpoint write failed. Callers log these; they never abort work.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The job row does not exist (never inserted, or removed externally).
    #[error("no stored job {0}")]
    MissingJob(JobId),
    /// The file row does not exist.
    #[error("no stored file '{name}' in job {job_id}")]
    MissingFile { job_id: JobId, name: String },
    /// The backing store is unavailable or rejected the write.
    #[error("state store unavailable")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Point-in-time persistence of job and file fields.
pub trait StateSink: Send + Sync + 'static {
    /// Save job-level fields (status, thread count). Files are saved separately.
    fn persist_job(&self, job: &Job) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Save every field of `file`. Last write wins.
    fn persist_file(&self, file: &JobFile) -> impl Future<Output = Result<(), SinkError>> + Send;
}
