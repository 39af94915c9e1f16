//! `fetchq checksum <id> <name>` – SHA-256 of a downloaded file.

use anyhow::{Context, Result};
use fetchq_core::checksum;
use fetchq_core::model::JobId;
use fetchq_core::transfer::destination_path;
use std::path::Path;

pub async fn run_checksum(downloads_root: &Path, id: &str, name: &str) -> Result<()> {
    let id: JobId = id.parse().with_context(|| format!("bad job id '{}'", id))?;
    let digest = checksum::sha256_job_file(downloads_root, id, name).await?;
    println!("{}  {}", digest, destination_path(downloads_root, id, name).display());
    Ok(())
}
