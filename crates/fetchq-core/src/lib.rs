//! fetchq core: a job-based file download engine.
//!
//! Jobs (sets of files) arrive on a bounded queue, the dispatcher runs a
//! bounded number of them at once, each job fans out over its files with a
//! per-job concurrency limit, and every state change is checkpointed
//! through a `StateSink` (the SQLite `JobStore` in production).

pub mod checkpoint;
pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod model;
pub mod poller;
pub mod queue;
pub mod sink;
pub mod store;
pub mod submit;
pub mod transfer;
pub mod worker;

