//! Top-level dispatch: pull jobs off the queue and run them concurrently.
//!
//! Up to `max_concurrent_jobs` job workers are in flight at once. When the
//! bound is reached the loop stops reading the queue until a worker
//! finishes. Cancellation stops intake immediately; in-flight workers see
//! the same signal through a child token and the loop waits for them.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::queue::JobReceiver;
use crate::sink::StateSink;
use crate::worker::{JobReport, JobWorker, WorkerSettings};

/// Summary of one dispatcher run.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Jobs that reached `Complete`.
    pub completed: Vec<JobReport>,
    /// Jobs stopped by cancellation (left at `Processing`).
    pub interrupted: Vec<JobReport>,
    /// Job worker tasks that panicked.
    pub panicked: usize,
}

impl DispatchReport {
    fn record(&mut self, report: JobReport) {
        if report.interrupted {
            self.interrupted.push(report);
        } else {
            self.completed.push(report);
        }
    }

    pub fn jobs_run(&self) -> usize {
        self.completed.len() + self.interrupted.len() + self.panicked
    }
}

pub struct Dispatcher<S> {
    sink: Arc<S>,
    settings: Arc<WorkerSettings>,
}

impl<S: StateSink> Dispatcher<S> {
    pub fn new(sink: Arc<S>, settings: Arc<WorkerSettings>) -> Self {
        Self { sink, settings }
    }

    /// Run until the queue is closed and drained, or until `cancel` fires.
    /// Returns once every started job worker has returned.
    pub async fn run(&self, mut queue: JobReceiver, cancel: CancellationToken) -> DispatchReport {
        let max_concurrent = self.settings.max_concurrent_jobs.max(1);
        let mut report = DispatchReport::default();
        let mut join_set: JoinSet<JobReport> = JoinSet::new();

        tracing::info!(max_concurrent, "dispatcher started");

        loop {
            if join_set.len() >= max_concurrent {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    Some(res) = join_set.join_next() => self.collect(&mut report, res),
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(res) = join_set.join_next(), if !join_set.is_empty() => {
                    self.collect(&mut report, res);
                }
                next = queue.next(&cancel) => {
                    let Some(job) = next else { break };
                    tracing::debug!(job_id = %job.id, running = join_set.len(), "starting job {}", job);
                    let worker = JobWorker::new(Arc::clone(&self.sink), Arc::clone(&self.settings));
                    let token = cancel.child_token();
                    join_set.spawn(async move { worker.run(job, token).await });
                }
            }
        }

        queue.close();
        if !join_set.is_empty() {
            tracing::info!(running = join_set.len(), "waiting for running jobs");
        }
        while let Some(res) = join_set.join_next().await {
            self.collect(&mut report, res);
        }

        tracing::info!(
            completed = report.completed.len(),
            interrupted = report.interrupted.len(),
            panicked = report.panicked,
            "dispatcher stopped"
        );
        report
    }

    fn collect(&self, report: &mut DispatchReport, res: Result<JobReport, tokio::task::JoinError>) {
        match res {
            Ok(job_report) => report.record(job_report),
            Err(e) => {
                tracing::error!("job worker task failed: {}", e);
                report.panicked += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Job, JobFile, JobId, JobStatus};
    use crate::queue::job_queue;
    use crate::sink::MemorySink;
    use chrono::Utc;
    use tempfile::tempdir;

    fn finished_job() -> Job {
        let id = JobId::new();
        let mut file = JobFile::new(id, "done", "http://127.0.0.1:1/done");
        file.started_at = Some(Utc::now());
        file.finished_at = Some(Utc::now());
        Job::new(id, 0, vec![file])
    }

    #[tokio::test]
    async fn drains_queue_then_returns_when_sender_dropped() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let settings = Arc::new(WorkerSettings::with_root(dir.path()));
        let (tx, rx) = job_queue(8);
        let ids: Vec<JobId> = (0..4)
            .map(|_| {
                let job = finished_job();
                let id = job.id;
                tx.enqueue(job).unwrap();
                id
            })
            .collect();
        drop(tx);

        let report = Dispatcher::new(Arc::clone(&sink), settings)
            .run(rx, CancellationToken::new())
            .await;

        assert_eq!(report.completed.len(), 4);
        assert!(report.interrupted.is_empty());
        for id in ids {
            assert_eq!(sink.job_status(id), Some(JobStatus::Complete));
        }
    }

    #[tokio::test]
    async fn cancel_stops_intake_of_queued_jobs() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let settings = Arc::new(WorkerSettings::with_root(dir.path()));
        let (tx, rx) = job_queue(8);
        let job = finished_job();
        let id = job.id;
        tx.enqueue(job).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = Dispatcher::new(Arc::clone(&sink), settings).run(rx, cancel).await;

        assert_eq!(report.jobs_run(), 0);
        assert_eq!(sink.job_status(id), None);
        assert!(tx.is_closed());
    }
}
