//! Store poller: feeds newly created jobs into the queue while `run --watch`
//! is active.

use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error;
use crate::model::{Job, JobId, JobStatus};
use crate::queue::{EnqueueError, JobSender};
use crate::store::JobStore;

/// Enqueue every `Created` job not enqueued before, then again every
/// `interval` until `cancel` fires or the queue closes. Jobs rejected because
/// the queue is full are retried on the next pass. Only ids still `Created`
/// are remembered between passes. The sender is dropped on
/// return so the dispatch loop sees the queue close.
///
/// Returns how many jobs were enqueued.
pub async fn poll_created_jobs(
    store: JobStore,
    sender: JobSender,
    interval: Duration,
    cancel: CancellationToken,
) -> usize {
    let mut seen: HashSet<JobId> = HashSet::new();
    let mut enqueued = 0;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let jobs = match store.jobs_with_status(JobStatus::Created).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!("polling created jobs failed: {}", error::describe_anyhow(&e));
                continue;
            }
        };

        match sweep(&mut seen, jobs, &sender) {
            Some(n) => enqueued += n,
            None => break,
        }
    }

    tracing::debug!(enqueued, "job poller stopped");
    enqueued
}

/// One pass over the current `Created` jobs. Returns how many were enqueued,
/// or None once the queue is closed.
fn sweep(seen: &mut HashSet<JobId>, jobs: Vec<Job>, sender: &JobSender) -> Option<usize> {
    // Forget jobs that left `Created`; they are never listed again.
    let current: HashSet<JobId> = jobs.iter().map(|j| j.id).collect();
    seen.retain(|id| current.contains(id));

    let mut enqueued = 0;
    for job in jobs {
        if seen.contains(&job.id) {
            continue;
        }
        let id = job.id;
        match sender.enqueue(job) {
            Ok(()) => {
                tracing::debug!(job_id = %id, "enqueued created job");
                seen.insert(id);
                enqueued += 1;
            }
            Err(EnqueueError::Full(_)) => {
                tracing::debug!("job queue full; retrying next poll");
                break;
            }
            Err(EnqueueError::Closed(_)) => return None,
        }
    }
    Some(enqueued)
}
