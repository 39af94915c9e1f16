//! In-memory state sink that keeps every checkpoint it receives.
//!
//! Used by tests and by embedders that want to observe engine progress
//! without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{SinkError, StateSink};
use crate::model::{Job, JobFile, JobId, JobStatus};

/// One recorded write, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Checkpoint {
    Job { id: JobId, status: JobStatus },
    File(JobFile),
}

#[derive(Default)]
struct Inner {
    log: Vec<Checkpoint>,
    jobs: HashMap<JobId, JobStatus>,
    files: HashMap<(JobId, String), JobFile>,
}

/// Sink backed by a mutex-guarded log. Can be switched into a failing mode
/// to exercise checkpoint-failure paths; failed writes are not recorded.
#[derive(Default)]
pub struct MemorySink {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// When true, every subsequent write fails with `SinkError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), SinkError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(SinkError::Unavailable("memory sink set to fail".into()));
        }
        Ok(())
    }

    /// Every successful write so far, oldest first.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.lock().log.clone()
    }

    /// Latest saved status of a job.
    pub fn job_status(&self, id: JobId) -> Option<JobStatus> {
        self.lock().jobs.get(&id).copied()
    }

    /// Latest saved state of a file.
    pub fn file(&self, job_id: JobId, name: &str) -> Option<JobFile> {
        self.lock().files.get(&(job_id, name.to_string())).cloned()
    }

    /// Every saved snapshot of one file, oldest first.
    pub fn file_history(&self, job_id: JobId, name: &str) -> Vec<JobFile> {
        self.lock()
            .log
            .iter()
            .filter_map(|c| match c {
                Checkpoint::File(f) if f.job_id == job_id && f.name == name => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every saved status of one job, oldest first.
    pub fn job_history(&self, id: JobId) -> Vec<JobStatus> {
        self.lock()
            .log
            .iter()
            .filter_map(|c| match c {
                Checkpoint::Job { id: jid, status } if *jid == id => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl StateSink for MemorySink {
    async fn persist_job(&self, job: &Job) -> Result<(), SinkError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner.jobs.insert(job.id, job.status);
        inner.log.push(Checkpoint::Job {
            id: job.id,
            status: job.status,
        });
        Ok(())
    }

    async fn persist_file(&self, file: &JobFile) -> Result<(), SinkError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner
            .files
            .insert((file.job_id, file.name.clone()), file.clone());
        inner.log.push(Checkpoint::File(file.clone()));
        Ok(())
    }
}
