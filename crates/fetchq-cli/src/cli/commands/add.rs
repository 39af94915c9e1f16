//! `fetchq add` – submit a job.

use anyhow::{bail, Context, Result};
use fetchq_core::store::JobStore;
use fetchq_core::submit::{submit_job, JobRequest, LinkRequest};
use std::path::PathBuf;

#[derive(Debug)]
pub struct AddArgs {
    pub links: Vec<String>,
    pub threads: u32,
    pub from: Option<PathBuf>,
}

/// Split `NAME=URL` at the first '='.
pub fn parse_link(arg: &str) -> Result<LinkRequest> {
    let Some((name, url)) = arg.split_once('=') else {
        bail!("expected NAME=URL, got '{}'", arg);
    };
    Ok(LinkRequest {
        filename: name.to_string(),
        link: url.to_string(),
    })
}

fn build_request(args: AddArgs) -> Result<JobRequest> {
    if let Some(path) = args.from {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        return serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()));
    }
    let links = args
        .links
        .iter()
        .map(|l| parse_link(l))
        .collect::<Result<Vec<_>>>()?;
    Ok(JobRequest {
        threads: args.threads,
        links,
    })
}

pub async fn run_add(store: &JobStore, args: AddArgs) -> Result<()> {
    let request = build_request(args)?;
    // No dispatcher in this process; the job waits as created for `fetchq run`.
    let job = submit_job(store, None, request).await?;
    println!("{}", job.id);
    Ok(())
}
