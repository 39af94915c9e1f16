//! Per-file transfer record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::JobId;

/// One remote-to-local download inside a job.
///
/// `started_at`, `finished_at`, `expected_size`, `bytes_transferred` and
/// `error` are owned by the file worker; the rest is fixed at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(rename = "job")]
    pub job_id: JobId,
    #[serde(rename = "filename")]
    pub name: String,
    #[serde(rename = "link")]
    pub url: String,
    #[serde(rename = "started")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finished")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "size")]
    pub expected_size: Option<u64>,
    #[serde(rename = "bytes")]
    pub bytes_transferred: Option<u64>,
    pub error: Option<String>,
}

impl JobFile {
    pub fn new(job_id: JobId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            job_id,
            name: name.into(),
            url: url.into(),
            started_at: None,
            finished_at: None,
            expected_size: None,
            bytes_transferred: None,
            error: None,
        }
    }

    /// Clear transfer fields for a fresh attempt starting at `now`.
    pub fn reset_for_attempt(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
        self.finished_at = None;
        self.expected_size = None;
        self.bytes_transferred = None;
        self.error = None;
    }

    /// True once the terminal checkpoint has been taken.
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.finished_at.is_some() && self.error.is_some()
    }
}

impl fmt::Display for JobFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}KB) [{}]",
            self.name,
            self.bytes_transferred.unwrap_or(0) / 1024,
            self.job_id
        )
    }
}
