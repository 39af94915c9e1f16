//! `StateSink` for the SQLite store: every checkpoint is an UPDATE of
//! an existing row.

use super::db::{size_to_column, timestamp_to_text, unix_timestamp, JobStore};
use crate::model::{Job, JobFile};
use crate::sink::{SinkError, StateSink};

fn unavailable(e: sqlx::Error) -> SinkError {
    SinkError::Unavailable(Box::new(e))
}

impl StateSink for JobStore {
    async fn persist_job(&self, job: &Job) -> Result<(), SinkError> {
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                thread_count = ?2,
                updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(job.status.as_str())
        .bind(i64::from(job.thread_count))
        .bind(unix_timestamp())
        .bind(job.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if r.rows_affected() == 0 {
            return Err(SinkError::MissingJob(job.id));
        }
        Ok(())
    }

    async fn persist_file(&self, file: &JobFile) -> Result<(), SinkError> {
        let r = sqlx::query(
            r#"
            UPDATE files
            SET url = ?1,
                started_at = ?2,
                finished_at = ?3,
                expected_size = ?4,
                bytes_transferred = ?5,
                error = ?6
            WHERE job_id = ?7 AND name = ?8
            "#,
        )
        .bind(&file.url)
        .bind(timestamp_to_text(file.started_at))
        .bind(timestamp_to_text(file.finished_at))
        .bind(size_to_column(file.expected_size))
        .bind(size_to_column(file.bytes_transferred))
        .bind(&file.error)
        .bind(file.job_id.to_string())
        .bind(&file.name)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if r.rows_affected() == 0 {
            return Err(SinkError::MissingFile {
                job_id: file.job_id,
                name: file.name.clone(),
            });
        }
        Ok(())
    }
}
