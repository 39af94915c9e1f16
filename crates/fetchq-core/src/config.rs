use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::checkpoint::CheckpointPolicy;
use crate::worker::WorkerSettings;

/// Upper bound accepted for per-job thread counts and file concurrency.
pub const MAX_THREADS: u32 = 24;

/// libcurl connection and stall limits (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Seconds allowed for connecting to the remote host.
    pub connect_timeout_secs: u64,
    /// Abort a transfer that stays below this rate (bytes/s) ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/fetchq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of jobs processed at once.
    pub max_concurrent_jobs: usize,
    /// Per-job file concurrency used when a job asks for 0 threads.
    pub default_file_concurrency: usize,
    /// Hard cap on per-job file concurrency.
    pub max_file_concurrency: usize,
    /// Root for downloaded files (`{root}/{job id}/{file name}`).
    /// Defaults to `~/.local/share/fetchq/downloads`.
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
    /// Transfer read/write chunk size in bytes.
    pub chunk_size_bytes: usize,
    /// Capacity of the in-process job queue.
    pub queue_capacity: usize,
    #[serde(default)]
    pub checkpoint: CheckpointPolicy,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            default_file_concurrency: 5,
            max_file_concurrency: MAX_THREADS as usize,
            downloads_dir: None,
            chunk_size_bytes: 8 * 1024,
            queue_capacity: 256,
            checkpoint: CheckpointPolicy::default(),
            transfer: TransferConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configured downloads root, or the XDG data default.
    pub fn downloads_root(&self) -> Result<PathBuf> {
        match &self.downloads_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_downloads_dir(),
        }
    }

    /// Read-only settings handed to the workers.
    pub fn worker_settings(&self, downloads_root: PathBuf) -> WorkerSettings {
        WorkerSettings {
            max_concurrent_jobs: self.max_concurrent_jobs.max(1),
            downloads_root,
            default_file_concurrency: self.default_file_concurrency.max(1),
            max_file_concurrency: self.max_file_concurrency.max(1),
            chunk_size: self.chunk_size_bytes.max(1),
            checkpoint: self.checkpoint,
            connect_timeout: Duration::from_secs(self.transfer.connect_timeout_secs),
            low_speed_limit: self.transfer.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.transfer.low_speed_time_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_downloads_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchq")?;
    Ok(xdg_dirs.get_data_home().join("fetchq").join("downloads"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: EngineConfig = toml::from_str(&data)?;
    Ok(cfg)
}
