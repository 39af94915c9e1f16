//! Job write operations.

use anyhow::Result;

use super::super::db::{size_to_column, timestamp_to_text, unix_timestamp, JobStore};
use crate::model::Job;

impl JobStore {
    /// Insert `job` and all of its files in one transaction.
    pub async fn insert_job(&self, job: &Job) -> Result<()> {
        let now = unix_timestamp();
        let id = job.id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO jobs (id, status, thread_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(job.status.as_str())
        .bind(i64::from(job.thread_count))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, file) in job.files.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO files (
                    job_id, name, position, url, started_at, finished_at,
                    expected_size, bytes_transferred, error
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&id)
            .bind(&file.name)
            .bind(position as i64)
            .bind(&file.url)
            .bind(timestamp_to_text(file.started_at))
            .bind(timestamp_to_text(file.finished_at))
            .bind(size_to_column(file.expected_size))
            .bind(size_to_column(file.bytes_transferred))
            .bind(&file.error)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
