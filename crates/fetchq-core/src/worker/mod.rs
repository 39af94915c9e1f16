//! Job and file workers.
//!
//! A [`JobWorker`] runs one job: it moves the job to `Processing`, fans the
//! files out to [`FileWorker`]s under a per-job semaphore, waits for all of
//! them, and marks the job `Complete` unless cancellation interrupted it.

mod file;
mod job;
mod settings;


pub use file::FileWorker;
pub use job::{JobReport, JobWorker};
pub use settings::WorkerSettings;

/// How one file's worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Terminal checkpoint taken, transfer succeeded.
    Finished,
    /// Terminal checkpoint taken (or attempted), error recorded.
    Failed,
    /// Transfer stopped by cancellation; no terminal checkpoint.
    Cancelled,
    /// Cancellation fired before the file got a concurrency slot.
    NotStarted,
    /// The file already had a terminal checkpoint from an earlier run.
    AlreadyFinished,
    /// The worker task panicked; the file is left as of its last checkpoint.
    Panicked,
}

impl FileOutcome {
    /// True if the file reached (or already had) a terminal checkpoint.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileOutcome::Finished | FileOutcome::Failed | FileOutcome::AlreadyFinished
        )
    }
}
