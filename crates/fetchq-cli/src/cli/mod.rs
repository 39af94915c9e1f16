//! CLI for the fetchq job downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchq_core::config;
use fetchq_core::store::JobStore;
use std::path::PathBuf;

use commands::{run_add, run_checksum, run_dispatcher, run_list, run_status, AddArgs, RunArgs};

/// Top-level CLI for fetchq.
#[derive(Debug, Parser)]
#[command(name = "fetchq")]
#[command(about = "fetchq: job-based batch file downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit a job. Prints the new job id.
    Add {
        /// Files as NAME=URL pairs.
        #[arg(value_name = "NAME=URL", required_unless_present = "from", conflicts_with = "from")]
        links: Vec<String>,

        /// Per-job file concurrency (0 = configured default).
        #[arg(long, default_value = "0", value_name = "N")]
        threads: u32,

        /// Read the job from a JSON file: {"threads": N, "links": [{"filename", "link"}]}.
        #[arg(long, value_name = "FILE", conflicts_with = "threads")]
        from: Option<PathBuf>,
    },

    /// Print one job and its files as JSON.
    Status {
        /// Job identifier.
        id: String,
    },

    /// List all jobs, newest first.
    List,

    /// Process created jobs until the queue drains (or until Ctrl-C).
    Run {
        /// Run up to N jobs at once (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        /// Default per-job file concurrency for jobs that ask for 0 (default from config).
        #[arg(long, value_name = "N")]
        threads: Option<usize>,

        /// Downloads root (default from config).
        #[arg(long, value_name = "DIR")]
        downloads: Option<PathBuf>,

        /// Keep running and pick up newly created jobs.
        #[arg(long)]
        watch: bool,

        /// Poll interval for --watch, in seconds.
        #[arg(long, default_value = "2", value_name = "S")]
        poll_secs: u64,

        /// Also re-run jobs left processing by an interrupted run.
        #[arg(long)]
        resume_interrupted: bool,
    },

    /// Compute SHA-256 of a downloaded file.
    Checksum {
        /// Job identifier.
        id: String,
        /// File name within the job.
        name: String,
        /// Downloads root (default from config).
        #[arg(long, value_name = "DIR")]
        downloads: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let store = JobStore::open_default().await?;

        match cli.command {
            CliCommand::Add {
                links,
                threads,
                from,
            } => run_add(&store, AddArgs { links, threads, from }).await?,
            CliCommand::Status { id } => run_status(&store, &id).await?,
            CliCommand::List => run_list(&store).await?,
            CliCommand::Run {
                jobs,
                threads,
                downloads,
                watch,
                poll_secs,
                resume_interrupted,
            } => {
                let args = RunArgs {
                    jobs,
                    threads,
                    downloads,
                    watch,
                    poll_secs,
                    resume_interrupted,
                };
                run_dispatcher(store, &cfg, args).await?;
            }
            CliCommand::Checksum {
                id,
                name,
                downloads,
            } => {
                let root = match downloads {
                    Some(dir) => dir,
                    None => cfg.downloads_root()?,
                };
                run_checksum(&root, &id, &name).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
