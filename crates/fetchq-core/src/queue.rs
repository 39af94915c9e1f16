//! Job queue: bounded channel between producers (submission, poller) and the
//! dispatch loop.
//!
//! Delivery is best-effort. An enqueue that finds the queue full or closed is
//! reported back to the producer; the job stays in the store as `Created` and
//! can be picked up by a later run.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::model::{Job, JobId};

/// Why a job could not be enqueued.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("job queue is full; job {0} not enqueued")]
    Full(JobId),
    #[error("job queue is closed; job {0} not enqueued")]
    Closed(JobId),
}

/// Create a queue holding at most `capacity` undelivered jobs.
pub fn job_queue(capacity: usize) -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (JobSender { tx }, JobReceiver { rx })
}

/// Producer half. Cheap to clone; the queue closes when every sender is dropped.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue without waiting.
    pub fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        let id = job.id;
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full(id),
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed(id),
        })
    }

    /// Enqueue, waiting for room if the queue is full.
    pub async fn send(&self, job: Job) -> Result<(), EnqueueError> {
        let id = job.id;
        self.tx.send(job).await.map_err(|_| EnqueueError::Closed(id))
    }

    /// True once the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the dispatch loop.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::Receiver<Job>,
}

impl JobReceiver {
    /// Wait for the next job. Returns `None` when the queue is closed and
    /// drained, or when `cancel` fires first.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Option<Job> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = self.rx.recv() => job,
        }
    }

    /// Stop accepting new jobs; already-queued jobs can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
