//! Job record and its status lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{JobFile, JobId};

/// Job status. Ordered by lifecycle position; a job never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Created,
    Processing,
    Complete,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
        }
    }

    /// Parse the stored (lowercase) form. Returns None for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(JobStatus::Created),
            "processing" => Some(JobStatus::Processing),
            "complete" => Some(JobStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work: a set of files downloaded together under one concurrency setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Requested per-job file concurrency; 0 means "use the configured default".
    #[serde(rename = "threads")]
    pub thread_count: u32,
    pub files: Vec<JobFile>,
}

impl Job {
    /// New job in `Created` state. Files are re-parented onto `id`.
    pub fn new(id: JobId, thread_count: u32, files: Vec<JobFile>) -> Self {
        let files = files
            .into_iter()
            .map(|mut f| {
                f.job_id = id;
                f
            })
            .collect();
        Self {
            id,
            status: JobStatus::Created,
            thread_count,
            files,
        }
    }

    /// Move status forward to `next`. Returns false (and leaves the status
    /// alone) if that would regress.
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if next < self.status {
            return false;
        }
        self.status = next;
        true
    }

    /// Files with a terminal checkpoint (`finished_at` set).
    pub fn finished_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_finished()).count()
    }

    /// Files that finished with a recorded error.
    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}) [{} file(s)]",
            self.id,
            self.status,
            self.files.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        let id = JobId::new();
        Job::new(
            id,
            0,
            vec![
                JobFile::new(JobId::new(), "a.bin", "http://example.com/a"),
                JobFile::new(JobId::new(), "b.bin", "http://example.com/b"),
            ],
        )
    }

    #[test]
    fn new_job_is_created_and_reparents_files() {
        let j = job();
        assert_eq!(j.status, JobStatus::Created);
        assert!(j.files.iter().all(|f| f.job_id == j.id));
    }

    #[test]
    fn status_never_regresses() {
        let mut j = job();
        assert!(j.advance(JobStatus::Processing));
        assert!(j.advance(JobStatus::Processing));
        assert!(j.advance(JobStatus::Complete));
        assert!(!j.advance(JobStatus::Processing));
        assert_eq!(j.status, JobStatus::Complete);
        assert!(!j.advance(JobStatus::Created));
    }

    #[test]
    fn status_str_roundtrip() {
        for s in [JobStatus::Created, JobStatus::Processing, JobStatus::Complete] {
            assert_eq!(JobStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(JobStatus::parse("paused"), None);
    }

    #[test]
    fn json_uses_wire_field_names() {
        let j = job();
        let v = serde_json::to_value(&j).unwrap();
        assert_eq!(v["status"], "Created");
        assert_eq!(v["threads"], 0);
        assert_eq!(v["files"][0]["filename"], "a.bin");
        assert_eq!(v["files"][0]["link"], "http://example.com/a");
        assert!(v["files"][0]["started"].is_null());
    }
}
