//! Drive one file from reset to a terminal checkpoint.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::checkpoint::ProgressWindow;
use crate::error;
use crate::model::JobFile;
use crate::sink::StateSink;
use crate::transfer::{
    self, TransferError, TransferEvent, TransferOutcome, TransferRequest,
};

use super::{FileOutcome, WorkerSettings};

/// Owns one file's transfer and every checkpoint of that file.
///
/// Checkpoints of a single file are strictly ordered: reset, optional
/// size-known, progress (windowed), then exactly one terminal checkpoint.
/// Cancellation skips the terminal checkpoint and only flushes unsaved
/// progress.
pub struct FileWorker<S> {
    sink: Arc<S>,
    settings: Arc<WorkerSettings>,
}

impl<S: StateSink> FileWorker<S> {
    pub fn new(sink: Arc<S>, settings: Arc<WorkerSettings>) -> Self {
        Self { sink, settings }
    }

    /// Download `file`, updating it in place.
    pub async fn run(&self, file: &mut JobFile, cancel: &CancellationToken) -> FileOutcome {
        let watch = Instant::now();
        tracing::debug!(job_id = %file.job_id, file = %file.name, "downloading {}...", file);

        file.reset_for_attempt(Utc::now());
        self.checkpoint(file).await;

        let destination =
            transfer::destination_path(&self.settings.downloads_root, file.job_id, &file.name);
        if let Some(dir) = destination.parent() {
            if let Err(source) = tokio::fs::create_dir_all(dir).await {
                let err = TransferError::Storage {
                    path: dir.to_path_buf(),
                    source,
                };
                return self.fail(file, &err).await;
            }
        }

        let request = TransferRequest {
            url: file.url.clone(),
            destination,
            chunk_size: self.settings.chunk_size,
            connect_timeout: self.settings.connect_timeout,
            low_speed_limit: self.settings.low_speed_limit,
            low_speed_time: self.settings.low_speed_time,
        };
        let (handle, mut events) = transfer::spawn_transfer(request, cancel.clone());

        let mut window = ProgressWindow::new(self.settings.checkpoint, Instant::now());
        while let Some(event) = events.recv().await {
            match event {
                TransferEvent::Headers { content_length } => {
                    file.expected_size = content_length;
                    file.bytes_transferred = Some(0);
                    self.checkpoint(file).await;
                    window.mark(0, Instant::now());
                }
                TransferEvent::Progress { total } => {
                    file.bytes_transferred = Some(total);
                    let now = Instant::now();
                    if window.should_checkpoint(total, now) {
                        self.checkpoint(file).await;
                        window.mark(total, now);
                    }
                }
            }
        }

        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(TransferError::Join(e)),
        };

        match result {
            Ok(TransferOutcome::Completed { bytes }) => {
                file.bytes_transferred = Some(bytes);
                file.finished_at = Some(Utc::now());
                self.checkpoint(file).await;
                tracing::debug!(
                    job_id = %file.job_id,
                    file = %file.name,
                    bytes,
                    "{} download complete [{:.1?}]",
                    file,
                    watch.elapsed()
                );
                FileOutcome::Finished
            }
            Ok(TransferOutcome::Cancelled { bytes }) => {
                // Only started transfers carry a count; a file cancelled before
                // its headers keeps `bytes_transferred = None`.
                if file.bytes_transferred.is_some() {
                    file.bytes_transferred = Some(bytes);
                    if window.is_dirty(bytes) {
                        self.checkpoint(file).await;
                    }
                }
                tracing::debug!(job_id = %file.job_id, file = %file.name, bytes, "download interrupted");
                FileOutcome::Cancelled
            }
            Err(err) => self.fail(file, &err).await,
        }
    }

    /// Record `err` with the terminal checkpoint. A failure of that
    /// checkpoint is logged and swallowed.
    async fn fail(&self, file: &mut JobFile, err: &TransferError) -> FileOutcome {
        let message = error::describe(err);
        tracing::warn!(
            job_id = %file.job_id,
            file = %file.name,
            error = %message,
            "{} download failed",
            file
        );
        file.error = Some(message);
        file.finished_at = Some(Utc::now());
        if let Err(e) = self.sink.persist_file(file).await {
            tracing::debug!(
                job_id = %file.job_id,
                file = %file.name,
                "unable to persist {} changes: {}",
                file,
                error::describe(&e)
            );
        }
        FileOutcome::Failed
    }

    async fn checkpoint(&self, file: &JobFile) {
        if let Err(e) = self.sink.persist_file(file).await {
            tracing::warn!(
                job_id = %file.job_id,
                file = %file.name,
                "checkpoint failed: {}",
                error::describe(&e)
            );
        }
    }
}
