//! `fetchq status <id>` – print one job as JSON.

use anyhow::{Context, Result};
use fetchq_core::model::JobId;
use fetchq_core::store::JobStore;

pub async fn run_status(store: &JobStore, id: &str) -> Result<()> {
    let id: JobId = id.parse().with_context(|| format!("bad job id '{}'", id))?;
    let job = store
        .get_job(id)
        .await?
        .with_context(|| format!("no job {}", id))?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}
