//! Job submission: validate a request, persist the job, hand it to the queue.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::MAX_THREADS;
use crate::model::{Job, JobFile, JobId};
use crate::queue::JobSender;
use crate::store::JobStore;

/// Longest accepted file name, in characters.
pub const MAX_NAME_LEN: usize = 128;
/// Longest accepted URL, in bytes.
pub const MAX_URL_LEN: usize = 1024;

/// A job as submitted by a client (`fetchq add --from job.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Per-job file concurrency; 0 means the configured default.
    #[serde(default)]
    pub threads: u32,
    pub links: Vec<LinkRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub filename: String,
    pub link: String,
}

/// One problem found in a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("threads must be between 0 and {max}, got {got}")]
    Threads { got: u32, max: u32 },
    #[error("a job needs at least one link")]
    NoLinks,
    #[error("link #{index}: filename is empty")]
    EmptyName { index: usize },
    #[error("link #{index}: filename is longer than {} characters", MAX_NAME_LEN)]
    NameTooLong { index: usize },
    #[error("link #{index}: filename '{name}' is not a plain file name")]
    UnsafeName { index: usize, name: String },
    #[error("link #{index}: filename '{name}' is used more than once")]
    DuplicateName { index: usize, name: String },
    #[error("link #{index}: url is longer than {} bytes", MAX_URL_LEN)]
    UrlTooLong { index: usize },
    #[error("link #{index}: url '{url}' is not valid: {reason}")]
    BadUrl {
        index: usize,
        url: String,
        reason: String,
    },
    #[error("link #{index}: url scheme '{scheme}' is not http or https")]
    BadScheme { index: usize, scheme: String },
}

/// Every violation found in a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job request: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A name must be exactly one normal path component on every platform.
fn is_safe_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

fn check_url(index: usize, raw: &str, out: &mut Vec<Violation>) {
    if raw.len() > MAX_URL_LEN {
        out.push(Violation::UrlTooLong { index });
        return;
    }
    match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        Ok(u) => out.push(Violation::BadScheme {
            index,
            scheme: u.scheme().to_string(),
        }),
        Err(e) => out.push(Violation::BadUrl {
            index,
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

impl JobRequest {
    /// Collect every violation; an empty result means the request is valid.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.threads > MAX_THREADS {
            out.push(Violation::Threads {
                got: self.threads,
                max: MAX_THREADS,
            });
        }
        if self.links.is_empty() {
            out.push(Violation::NoLinks);
        }

        let mut seen = HashSet::new();
        for (index, link) in self.links.iter().enumerate() {
            let name = link.filename.as_str();
            if name.is_empty() {
                out.push(Violation::EmptyName { index });
            } else if name.chars().count() > MAX_NAME_LEN {
                out.push(Violation::NameTooLong { index });
            } else if !is_safe_name(name) {
                out.push(Violation::UnsafeName {
                    index,
                    name: name.to_string(),
                });
            } else if !seen.insert(name) {
                out.push(Violation::DuplicateName {
                    index,
                    name: name.to_string(),
                });
            }
            check_url(index, &link.link, &mut out);
        }
        out
    }

    /// Validate and build a `Created` job with a fresh id.
    pub fn into_job(self) -> Result<Job, ValidationError> {
        let violations = self.violations();
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        let id = JobId::new();
        let files = self
            .links
            .into_iter()
            .map(|l| JobFile::new(id, l.filename, l.link))
            .collect();
        Ok(Job::new(id, self.threads, files))
    }
}

/// Why a submission failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("unable to store job: {0:#}")]
    Store(anyhow::Error),
}

/// Validate `request`, persist it as a `Created` job and offer it to the
/// queue. Queueing is best-effort: if there is no queue, or it rejects the
/// job, the stored job stays `Created` for a later run.
pub async fn submit_job(
    store: &JobStore,
    queue: Option<&JobSender>,
    request: JobRequest,
) -> Result<Job, SubmitError> {
    let job = request.into_job()?;
    store
        .insert_job(&job)
        .await
        .map_err(SubmitError::Store)?;
    tracing::info!(job_id = %job.id, files = job.files.len(), "job {} submitted", job);

    if let Some(queue) = queue {
        if let Err(e) = queue.enqueue(job.clone()) {
            tracing::warn!(job_id = %job.id, "{}; it stays created", e);
        }
    }
    Ok(job)
}
