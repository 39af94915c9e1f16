//! `fetchq list` – table of all jobs.

use anyhow::Result;
use fetchq_core::store::JobStore;

pub async fn run_list(store: &JobStore) -> Result<()> {
    let jobs = store.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in database.");
        return Ok(());
    }
    println!(
        "{:<32} {:<10} {:>7} {:>6} {:>6} {:>12}",
        "ID", "STATUS", "THREADS", "DONE", "FAILED", "BYTES"
    );
    for j in jobs {
        println!(
            "{:<32} {:<10} {:>7} {:>6} {:>6} {:>12}",
            j.id.to_string(),
            j.status.as_str(),
            j.thread_count,
            format!("{}/{}", j.done, j.files),
            j.failed,
            j.bytes
        );
    }
    Ok(())
}
