//! Read-only values the workers are constructed with.

use std::path::PathBuf;
use std::time::Duration;

use crate::checkpoint::CheckpointPolicy;

/// Worker configuration, derived from `EngineConfig::worker_settings`.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Jobs the dispatch loop runs at once.
    pub max_concurrent_jobs: usize,
    /// Destination root: files land in `{downloads_root}/{job id}/{name}`.
    pub downloads_root: PathBuf,
    pub default_file_concurrency: usize,
    pub max_file_concurrency: usize,
    pub chunk_size: usize,
    pub checkpoint: CheckpointPolicy,
    pub connect_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl WorkerSettings {
    /// Defaults matching `EngineConfig::default()` with an explicit root.
    pub fn with_root(downloads_root: impl Into<PathBuf>) -> Self {
        crate::config::EngineConfig::default().worker_settings(downloads_root.into())
    }

    /// Per-job file concurrency: the job's own thread count, or the default
    /// when it asks for 0, capped at `max_file_concurrency`.
    pub fn effective_concurrency(&self, thread_count: u32) -> usize {
        let requested = if thread_count == 0 {
            self.default_file_concurrency
        } else {
            thread_count as usize
        };
        requested.clamp(1, self.max_file_concurrency.max(1))
    }
}
