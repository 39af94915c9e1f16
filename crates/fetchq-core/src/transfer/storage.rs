//! Destination files for transfers.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::model::JobId;

/// `{root}/{job id}/{file name}`.
pub fn destination_path(root: &Path, job_id: JobId, name: &str) -> PathBuf {
    root.join(job_id.to_string()).join(name)
}

/// Sequential writer that creates its file on the first chunk, so a
/// response rejected before any body byte leaves nothing on disk.
/// Each chunk goes straight to the OS (no userspace buffering).
pub(crate) struct DestinationWriter {
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl DestinationWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            written: 0,
        }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let f = File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            self.file = Some(f);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("destination file not open"))
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file()?.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Create the file if the body was empty and sync it to disk.
    pub fn finish(&mut self) -> io::Result<u64> {
        self.file()?.sync_all()?;
        Ok(self.written)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn destination_is_root_job_name() {
        let id = JobId::new();
        let p = destination_path(Path::new("/dl"), id, "a.bin");
        assert_eq!(p, PathBuf::from(format!("/dl/{}/a.bin", id)));
    }

    #[test]
    fn file_created_lazily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut w = DestinationWriter::new(&path);
        assert!(!path.exists());
        w.write_chunk(b"hello ").unwrap();
        w.write_chunk(b"world").unwrap();
        assert_eq!(w.written(), 11);
        assert_eq!(w.finish().unwrap(), 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn empty_body_still_produces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        let mut w = DestinationWriter::new(&path);
        assert_eq!(w.finish().unwrap(), 0);
        assert_eq!(std::fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn overwrites_previous_attempt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("again.bin");
        std::fs::write(&path, b"stale content from before").unwrap();
        let mut w = DestinationWriter::new(&path);
        w.write_chunk(b"new").unwrap();
        w.finish().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn unwritable_destination_errors_on_first_chunk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("x.bin");
        let mut w = DestinationWriter::new(&path);
        assert!(w.write_chunk(b"x").is_err());
        assert_eq!(w.written(), 0);
    }
}
