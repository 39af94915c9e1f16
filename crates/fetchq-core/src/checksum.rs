//! SHA-256 of downloaded files, computed on demand (`fetchq checksum`).

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::model::JobId;
use crate::transfer::destination_path;

const BUF_SIZE: usize = 64 * 1024;

/// Lowercase hex SHA-256 of the file at `path`, read in bounded chunks.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a job file at its destination under `downloads_root`.
pub async fn sha256_job_file(downloads_root: &Path, job_id: JobId, name: &str) -> Result<String> {
    let path = destination_path(downloads_root, job_id, name);
    tokio::task::spawn_blocking(move || sha256_path(&path))
        .await
        .context("checksum task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            sha256_path(f.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn job_file_at_destination() {
        let dir = tempfile::tempdir().unwrap();
        let id = JobId::new();
        let path = destination_path(dir.path(), id, "hello.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"hello\n").unwrap();

        let digest = sha256_job_file(dir.path(), id, "hello.txt").await.unwrap();
        assert_eq!(
            digest,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_job_file(dir.path(), JobId::new(), "nope.bin")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("nope.bin"));
    }
}
