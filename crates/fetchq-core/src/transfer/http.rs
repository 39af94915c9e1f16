//! Blocking streaming GET over a libcurl easy handle.

use std::cell::Cell;

use curl::easy::Easy;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::headers::{HeadBlock, ResponseHead};
use super::storage::DestinationWriter;
use super::{TransferError, TransferEvent, TransferOutcome, TransferRequest};

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: u32 = 10;

/// Runs in the current thread; call through `spawn_transfer` from async code.
pub(super) fn download(
    req: &TransferRequest,
    events: &mpsc::Sender<TransferEvent>,
    cancel: &CancellationToken,
) -> Result<TransferOutcome, TransferError> {
    let transport = |source: curl::Error| TransferError::Transport {
        url: req.url.clone(),
        source,
    };

    let mut easy = Easy::new();
    easy.url(&req.url).map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.max_redirections(MAX_REDIRECTS).map_err(transport)?;
    easy.buffer_size(req.chunk_size).map_err(transport)?;
    easy.connect_timeout(req.connect_timeout).map_err(transport)?;
    easy.low_speed_limit(req.low_speed_limit).map_err(transport)?;
    easy.low_speed_time(req.low_speed_time).map_err(transport)?;
    // Error statuses end the transfer before any body byte is written.
    easy.fail_on_error(true).map_err(transport)?;
    easy.progress(true).map_err(transport)?;

    let mut head = ResponseHead::default();
    let mut writer = DestinationWriter::new(&req.destination);
    let mut storage_error: Option<std::io::Error> = None;
    let cancelled = Cell::new(false);
    let receiver_gone = Cell::new(false);
    let final_head: Cell<Option<HeadBlock>> = Cell::new(None);
    let headers_sent = Cell::new(false);

    // Sends `Headers` once, before the first body byte (or at the end for an
    // empty body). Returns false if the receiver is gone.
    let report_headers = || {
        if headers_sent.get() {
            return true;
        }
        headers_sent.set(true);
        let ev = TransferEvent::Headers {
            content_length: final_head.get().and_then(|b| b.content_length),
        };
        if events.blocking_send(ev).is_err() {
            receiver_gone.set(true);
            return false;
        }
        true
    };

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                // Proxy CONNECT and redirect blocks come first; the last 2xx
                // block before the body describes the resource.
                if let Some(block) = head.push_line(line) {
                    if block.is_success() {
                        final_head.set(Some(block));
                    }
                }
                true
            })
            .map_err(transport)?;
        transfer
            .write_function(|data| {
                if cancel.is_cancelled() {
                    cancelled.set(true);
                    return Ok(0);
                }
                if !report_headers() {
                    return Ok(0);
                }
                if let Err(e) = writer.write_chunk(data) {
                    storage_error = Some(e);
                    return Ok(0);
                }
                let ev = TransferEvent::Progress {
                    total: writer.written(),
                };
                if events.blocking_send(ev).is_err() {
                    receiver_gone.set(true);
                    return Ok(0);
                }
                Ok(data.len())
            })
            .map_err(transport)?;
        transfer
            .progress_function(|_, _, _, _| {
                if cancel.is_cancelled() {
                    cancelled.set(true);
                    return false;
                }
                true
            })
            .map_err(transport)?;
        transfer.perform()
    };

    if cancelled.get() {
        tracing::debug!(url = %req.url, bytes = writer.written(), "transfer cancelled");
        return Ok(TransferOutcome::Cancelled {
            bytes: writer.written(),
        });
    }
    if let Some(source) = storage_error {
        return Err(TransferError::Storage {
            path: writer.path().to_path_buf(),
            source,
        });
    }
    if receiver_gone.get() {
        return Err(TransferError::ReceiverGone);
    }

    let status = easy.response_code().unwrap_or(0);
    if let Err(source) = performed {
        if status >= 400 {
            return Err(TransferError::Status {
                url: req.url.clone(),
                status,
            });
        }
        return Err(transport(source));
    }
    if !(200..300).contains(&status) {
        return Err(TransferError::Status {
            url: req.url.clone(),
            status,
        });
    }

    if !report_headers() {
        return Err(TransferError::ReceiverGone);
    }
    let bytes = writer.finish().map_err(|source| TransferError::Storage {
        path: req.destination.clone(),
        source,
    })?;
    Ok(TransferOutcome::Completed { bytes })
}
