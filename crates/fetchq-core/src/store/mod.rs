//! Persistent job store (SQLite via sqlx).
//!
//! Holds jobs and their files. The engine writes through the `StateSink`
//! impl; submission, listing and the poller use the query methods.

mod db;
mod jobs;
mod sink;
mod types;


pub use db::{default_db_path, JobStore};
pub use types::JobSummary;

#[cfg(test)]
pub(crate) use db::open_memory;
