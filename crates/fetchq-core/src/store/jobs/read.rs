//! Job read operations: get, list, select by status.

use anyhow::{anyhow, Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::{column_to_size, text_to_timestamp, JobStore};
use super::super::types::JobSummary;
use crate::model::{Job, JobFile, JobId, JobStatus};

fn parse_status(s: &str) -> Result<JobStatus> {
    JobStatus::parse(s).ok_or_else(|| anyhow!("unknown stored job status '{}'", s))
}

fn parse_id(s: &str) -> Result<JobId> {
    s.parse().with_context(|| format!("bad stored job id '{}'", s))
}

fn count(row: &SqliteRow, col: &str) -> u32 {
    let n: i64 = row.get(col);
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl JobStore {
    /// Fetch a job with all of its files, in submission order.
    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT id, status, thread_count
            FROM jobs
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        self.job_from_row(&row).await.map(Some)
    }

    /// All jobs currently in `status`, oldest first.
    pub async fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let rows = sqlx::query(
            r#"
            SELECT id, status, thread_count
            FROM jobs
            WHERE status = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.job_from_row(&row).await?);
        }
        Ok(out)
    }

    /// List all jobs, newest first, with per-job file counters.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT
                j.id, j.status, j.thread_count, j.created_at,
                COUNT(f.name) AS files,
                COALESCE(SUM(CASE WHEN f.finished_at IS NOT NULL AND f.error IS NULL THEN 1 ELSE 0 END), 0) AS done,
                COALESCE(SUM(CASE WHEN f.finished_at IS NOT NULL AND f.error IS NOT NULL THEN 1 ELSE 0 END), 0) AS failed,
                COALESCE(SUM(f.bytes_transferred), 0) AS bytes
            FROM jobs j
            LEFT JOIN files f ON f.job_id = j.id
            GROUP BY j.id
            ORDER BY j.created_at DESC, j.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let status: String = row.get("status");
            let thread_count: i64 = row.get("thread_count");
            let bytes: i64 = row.get("bytes");
            out.push(JobSummary {
                id: parse_id(&id)?,
                status: parse_status(&status)?,
                thread_count: u32::try_from(thread_count).unwrap_or(0),
                files: count(&row, "files"),
                done: count(&row, "done"),
                failed: count(&row, "failed"),
                bytes: u64::try_from(bytes).unwrap_or(0),
                created_at: row.get("created_at"),
            });
        }
        Ok(out)
    }

    async fn job_from_row(&self, row: &SqliteRow) -> Result<Job> {
        let id: String = row.get("id");
        let status: String = row.get("status");
        let thread_count: i64 = row.get("thread_count");
        let id = parse_id(&id)?;

        Ok(Job {
            id,
            status: parse_status(&status)?,
            thread_count: u32::try_from(thread_count).unwrap_or(0),
            files: self.files_of(id).await?,
        })
    }

    async fn files_of(&self, job_id: JobId) -> Result<Vec<JobFile>> {
        let rows = sqlx::query(
            r#"
            SELECT
                name, url, started_at, finished_at,
                expected_size, bytes_transferred, error
            FROM files
            WHERE job_id = ?1
            ORDER BY position ASC
            "#,
        )
        .bind(job_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(JobFile {
                job_id,
                name: row.get("name"),
                url: row.get("url"),
                started_at: text_to_timestamp(row.get("started_at"))?,
                finished_at: text_to_timestamp(row.get("finished_at"))?,
                expected_size: column_to_size(row.get("expected_size")),
                bytes_transferred: column_to_size(row.get("bytes_transferred")),
                error: row.get("error"),
            });
        }
        Ok(out)
    }
}
