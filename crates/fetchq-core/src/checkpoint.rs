//! Windowed progress checkpointing.
//!
//! Persisting after every chunk costs one store write per 8 KiB. Instead a
//! progress checkpoint is taken once either the time window or the byte
//! window has elapsed since the previous one. The caller always flushes the
//! final count with the terminal (or cancellation) checkpoint, so the
//! persisted value still converges to the bytes actually written.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// When to persist intermediate progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointPolicy {
    /// Minimum time between progress checkpoints.
    #[serde(with = "millis", rename = "interval_ms")]
    pub interval: Duration,
    /// Bytes transferred since the last checkpoint that force a new one.
    pub bytes: u64,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            bytes: 1024 * 1024,
        }
    }
}

impl CheckpointPolicy {
    /// Persist after every chunk.
    pub fn every_chunk() -> Self {
        Self {
            interval: Duration::ZERO,
            bytes: 0,
        }
    }
}

/// Per-attempt tracker deciding when the next progress checkpoint is due.
#[derive(Debug)]
pub struct ProgressWindow {
    policy: CheckpointPolicy,
    last_bytes: Option<u64>,
    last_at: Instant,
}

impl ProgressWindow {
    pub fn new(policy: CheckpointPolicy, now: Instant) -> Self {
        Self {
            policy,
            last_bytes: None,
            last_at: now,
        }
    }

    /// True if `total` should be persisted now.
    pub fn should_checkpoint(&self, total: u64, now: Instant) -> bool {
        let Some(last) = self.last_bytes else {
            return true;
        };
        if total <= last {
            return false;
        }
        total - last >= self.policy.bytes
            || now.saturating_duration_since(self.last_at) >= self.policy.interval
    }

    /// Record that `total` was persisted at `now`.
    pub fn mark(&mut self, total: u64, now: Instant) {
        self.last_bytes = Some(total);
        self.last_at = now;
    }

    /// True if `total` is newer than what was last persisted.
    pub fn is_dirty(&self, total: u64) -> bool {
        self.last_bytes != Some(total)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ms: u64, bytes: u64) -> CheckpointPolicy {
        CheckpointPolicy {
            interval: Duration::from_millis(ms),
            bytes,
        }
    }

    #[test]
    fn first_progress_is_always_due() {
        let t0 = Instant::now();
        let w = ProgressWindow::new(policy(60_000, u64::MAX), t0);
        assert!(w.should_checkpoint(0, t0));
    }

    #[test]
    fn byte_window_triggers() {
        let t0 = Instant::now();
        let mut w = ProgressWindow::new(policy(60_000, 100), t0);
        w.mark(0, t0);
        assert!(!w.should_checkpoint(99, t0));
        assert!(w.should_checkpoint(100, t0));
    }

    #[test]
    fn time_window_triggers() {
        let t0 = Instant::now();
        let mut w = ProgressWindow::new(policy(500, u64::MAX), t0);
        w.mark(10, t0);
        assert!(!w.should_checkpoint(20, t0 + Duration::from_millis(499)));
        assert!(w.should_checkpoint(20, t0 + Duration::from_millis(500)));
    }

    #[test]
    fn never_due_without_new_bytes() {
        let t0 = Instant::now();
        let mut w = ProgressWindow::new(CheckpointPolicy::every_chunk(), t0);
        w.mark(42, t0);
        assert!(!w.should_checkpoint(42, t0 + Duration::from_secs(5)));
        assert!(w.should_checkpoint(43, t0));
    }

    #[test]
    fn dirty_tracks_last_persisted_value() {
        let t0 = Instant::now();
        let mut w = ProgressWindow::new(CheckpointPolicy::default(), t0);
        assert!(w.is_dirty(0));
        w.mark(8192, t0);
        assert!(!w.is_dirty(8192));
        assert!(w.is_dirty(16384));
    }

    #[test]
    fn policy_toml_uses_millis() {
        let p: CheckpointPolicy = toml::from_str("interval_ms = 250\nbytes = 4096\n").unwrap();
        assert_eq!(p.interval, Duration::from_millis(250));
        assert_eq!(p.bytes, 4096);
    }
}
