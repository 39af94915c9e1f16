//! Transfer executor: stream one remote resource into a local file.
//!
//! The GET runs on a libcurl easy handle inside `spawn_blocking`. The body
//! arrives in chunks of at most `chunk_size` bytes; each chunk is written to
//! the destination and the cumulative count is sent to the caller over a
//! bounded channel. Headers are reported before the first body byte.
//! Cancellation is checked at every chunk boundary and from libcurl's
//! progress callback while the connection is idle.

mod headers;
mod http;
mod storage;

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use storage::destination_path;

/// Events buffered between the blocking transfer and its file worker.
const EVENT_BUFFER: usize = 32;

/// Everything needed to run one transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub destination: PathBuf,
    pub chunk_size: usize,
    pub connect_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

/// Reported to the caller while the transfer runs, in this order:
/// at most one `Headers`, then zero or more `Progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    /// Headers of the final 2xx response, sent once before the first body
    /// byte (or at the end of an empty body).
    Headers { content_length: Option<u64> },
    /// Cumulative bytes written to the destination.
    Progress { total: u64 },
}

/// How a transfer that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Whole body written and synced.
    Completed { bytes: u64 },
    /// Stopped at a chunk boundary because cancellation fired.
    Cancelled { bytes: u64 },
}

/// A transfer that failed. Transport, HTTP status and local storage problems
/// all surface here; the file worker turns them into a stored message.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u32 },
    #[error("writing {} failed", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("progress receiver dropped")]
    ReceiverGone,
    #[error("transfer task ended abnormally")]
    Join(#[source] tokio::task::JoinError),
}

/// Start a transfer on the blocking pool. Drain the returned receiver until
/// it yields `None`, then await the handle for the outcome.
pub fn spawn_transfer(
    request: TransferRequest,
    cancel: CancellationToken,
) -> (
    JoinHandle<Result<TransferOutcome, TransferError>>,
    mpsc::Receiver<TransferEvent>,
) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let handle = tokio::task::spawn_blocking(move || http::download(&request, &tx, &cancel));
    (handle, rx)
}
