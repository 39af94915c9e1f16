//! Tests for the `run` summary and task plumbing.

use crate::cli::commands::{join_poller, report_lines};
use fetchq_core::dispatch::DispatchReport;
use fetchq_core::model::{Job, JobFile, JobId, JobStatus};
use fetchq_core::worker::{FileOutcome, JobReport};

fn finished(mut file: JobFile, error: Option<&str>) -> JobFile {
    file.started_at = Some(Default::default());
    file.finished_at = Some(Default::default());
    file.error = error.map(str::to_string);
    file
}

#[test]
fn failures_from_earlier_runs_are_not_counted_ok() {
    let id = JobId::new();
    let files = vec![
        finished(JobFile::new(id, "old.bin", "http://h/old.bin"), Some("HTTP 404")),
        finished(JobFile::new(id, "new.bin", "http://h/new.bin"), None),
    ];
    let mut job = Job::new(id, 0, files);
    job.status = JobStatus::Complete;
    let report = DispatchReport {
        completed: vec![JobReport {
            job,
            outcomes: vec![FileOutcome::AlreadyFinished, FileOutcome::Finished],
            interrupted: false,
        }],
        ..DispatchReport::default()
    };

    let lines = report_lines(&report);
    assert_eq!(lines, vec![format!("{}  complete  1/2 file(s) ok", id)]);
}

#[test]
fn empty_run_says_so() {
    assert_eq!(report_lines(&DispatchReport::default()), vec!["No created jobs."]);
}

#[tokio::test]
async fn panicked_poller_is_reported_as_zero() {
    let handle = tokio::spawn(async {
        if true {
            panic!("poller blew up");
        }
        0usize
    });
    assert_eq!(join_poller(handle).await, 0);
    assert_eq!(join_poller(tokio::spawn(async { 3 })).await, 3);
}
