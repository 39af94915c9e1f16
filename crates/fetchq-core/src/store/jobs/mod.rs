//! Job CRUD on `JobStore`.

mod read;
mod write;
