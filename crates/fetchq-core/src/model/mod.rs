//! Job and file records shared by the engine, the store and the CLI.
//!
//! A [`Job`] owns a non-empty set of [`JobFile`]s. The engine mutates job
//! status (job worker) and file transfer fields (file worker); everything
//! else is fixed at submission time.

mod file;
mod id;
mod job;

pub use file::JobFile;
pub use id::{JobId, ParseJobIdError};
pub use job::{Job, JobStatus};
