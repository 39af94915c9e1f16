//! Run one job: status transitions plus bounded per-job file fan-out.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error;
use crate::model::{Job, JobFile, JobStatus};
use crate::sink::StateSink;

use super::{FileOutcome, FileWorker, WorkerSettings};

/// What a job worker did with its job.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// The job with every file in its final in-memory state.
    pub job: Job,
    /// Outcome per file, same order as `job.files`.
    pub outcomes: Vec<FileOutcome>,
    /// True if cancellation stopped the job before every file was terminal.
    pub interrupted: bool,
}

/// Executes a job to completion (or until cancelled).
pub struct JobWorker<S> {
    sink: Arc<S>,
    settings: Arc<WorkerSettings>,
}

impl<S: StateSink> JobWorker<S> {
    pub fn new(sink: Arc<S>, settings: Arc<WorkerSettings>) -> Self {
        Self { sink, settings }
    }

    /// Process `job`. Status goes to `Processing` up front and to `Complete`
    /// once every file has a terminal checkpoint, whatever the per-file
    /// results. If cancellation interrupts the fan-out, the status is left
    /// at `Processing`.
    pub async fn run(&self, mut job: Job, cancel: CancellationToken) -> JobReport {
        let watch = Instant::now();
        let threads = self.settings.effective_concurrency(job.thread_count);
        tracing::debug!(job_id = %job.id, threads, "processing job {} [{} thread(s)]...", job, threads);

        job.advance(JobStatus::Processing);
        self.checkpoint(&job).await;

        let files = std::mem::take(&mut job.files);
        let originals = files.clone();
        let permits = Arc::new(Semaphore::new(threads));
        let mut join_set = JoinSet::new();

        for (idx, file) in files.into_iter().enumerate() {
            let worker = FileWorker::new(Arc::clone(&self.sink), Arc::clone(&self.settings));
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let mut file = file;
                if file.is_finished() {
                    return (idx, file, FileOutcome::AlreadyFinished);
                }
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = permits.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return (idx, file, FileOutcome::NotStarted);
                };
                if cancel.is_cancelled() {
                    return (idx, file, FileOutcome::NotStarted);
                }
                let outcome = worker.run(&mut file, &cancel).await;
                (idx, file, outcome)
            });
        }

        let mut slots: Vec<Option<(JobFile, FileOutcome)>> =
            (0..originals.len()).map(|_| None).collect();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, file, outcome)) => slots[idx] = Some((file, outcome)),
                Err(e) => tracing::error!(job_id = %job.id, "file worker task failed: {}", e),
            }
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        job.files = slots
            .into_iter()
            .zip(originals)
            .map(|(slot, original)| {
                let (file, outcome) = slot.unwrap_or((original, FileOutcome::Panicked));
                outcomes.push(outcome);
                file
            })
            .collect();

        let interrupted = !outcomes.iter().all(|o| o.is_terminal());
        if interrupted {
            tracing::info!(
                job_id = %job.id,
                finished = job.finished_files(),
                "job {} interrupted; status left at {}",
                job,
                job.status
            );
        } else {
            job.advance(JobStatus::Complete);
            self.checkpoint(&job).await;
            tracing::debug!(
                job_id = %job.id,
                failed = job.failed_files(),
                "job {} complete [{:.1?}]",
                job,
                watch.elapsed()
            );
        }

        JobReport {
            job,
            outcomes,
            interrupted,
        }
    }

    async fn checkpoint(&self, job: &Job) {
        if let Err(e) = self.sink.persist_job(job).await {
            tracing::error!(job_id = %job.id, "unable to persist job {}: {}", job, error::describe(&e));
        }
    }
}
