//! `fetchq run` – feed stored jobs to the dispatcher and process them.

use anyhow::{Context, Result};
use fetchq_core::config::EngineConfig;
use fetchq_core::dispatch::{DispatchReport, Dispatcher};
use fetchq_core::model::JobStatus;
use fetchq_core::poller;
use fetchq_core::queue::{job_queue, JobSender};
use fetchq_core::store::JobStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct RunArgs {
    pub jobs: Option<usize>,
    pub threads: Option<usize>,
    pub downloads: Option<PathBuf>,
    pub watch: bool,
    pub poll_secs: u64,
    pub resume_interrupted: bool,
}

/// Send every stored job in `status`; stops early if the dispatcher is gone.
async fn feed(store: &JobStore, sender: &JobSender, status: JobStatus) -> Result<usize> {
    let mut sent = 0;
    for job in store.jobs_with_status(status).await? {
        if sender.send(job).await.is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

/// One line per job for the end-of-run summary.
pub fn report_lines(report: &DispatchReport) -> Vec<String> {
    if report.jobs_run() == 0 {
        return vec!["No created jobs.".to_string()];
    }
    let mut lines = Vec::new();
    for r in &report.completed {
        // Count from the files themselves: failures from earlier runs are
        // skipped as already finished but still failed.
        lines.push(format!(
            "{}  complete  {}/{} file(s) ok",
            r.job.id,
            r.job.files.len() - r.job.failed_files(),
            r.job.files.len()
        ));
    }
    for r in &report.interrupted {
        lines.push(format!(
            "{}  interrupted  {}/{} file(s) finished",
            r.job.id,
            r.job.finished_files(),
            r.job.files.len()
        ));
    }
    if report.panicked > 0 {
        lines.push(format!(
            "{} job(s) aborted unexpectedly; see log",
            report.panicked
        ));
    }
    lines
}

/// Wait for the poller; a panicked poller is logged and counts as nothing enqueued.
pub async fn join_poller(handle: JoinHandle<usize>) -> usize {
    match handle.await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("job poller task failed: {}", e);
            0
        }
    }
}

pub async fn run_dispatcher(store: JobStore, cfg: &EngineConfig, args: RunArgs) -> Result<()> {
    let root = match args.downloads {
        Some(dir) => dir,
        None => cfg.downloads_root()?,
    };
    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("create downloads dir {}", root.display()))?;

    let mut settings = cfg.worker_settings(root);
    if let Some(jobs) = args.jobs {
        settings.max_concurrent_jobs = jobs.max(1);
    }
    if let Some(threads) = args.threads {
        settings.default_file_concurrency = threads.max(1);
    }

    let store = Arc::new(store);
    let cancel = CancellationToken::new();
    let (sender, receiver) = job_queue(cfg.queue_capacity);

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; finishing up");
                eprintln!("Interrupted; stopping after in-flight transfers.");
                cancel.cancel();
            }
        })
    };

    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::new(settings));
    let dispatch = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run(receiver, cancel).await }
    });

    if args.resume_interrupted {
        let n = feed(&store, &sender, JobStatus::Processing).await?;
        tracing::info!("re-enqueued {} interrupted job(s)", n);
    }

    let poller = if args.watch {
        let interval = Duration::from_secs(args.poll_secs.max(1));
        Some(tokio::spawn(poller::poll_created_jobs(
            JobStore::clone(&store),
            sender,
            interval,
            cancel.clone(),
        )))
    } else {
        let n = feed(&store, &sender, JobStatus::Created).await?;
        tracing::info!("enqueued {} created job(s)", n);
        // Closing the queue lets the dispatcher return once it drains.
        drop(sender);
        None
    };

    let report = dispatch.await.context("dispatcher task failed")?;
    if let Some(poller) = poller {
        let n = join_poller(poller).await;
        tracing::info!("poller enqueued {} job(s)", n);
    }
    ctrl_c.abort();

    for line in report_lines(&report) {
        println!("{}", line);
    }
    Ok(())
}
