//! Job records and their status transitions.
//!
//! Every transition is a single conditional `UPDATE`; the `WHERE status ...`
//! guard is what keeps transitions monotonic under concurrent writers.

use crate::error::DatabaseError;
use crate::eta::EtaSample;
use crate::types::{FailureReason, JobId, JobStatus};
use crate::{Error, Result};

use super::{Database, Job, NewJob};

impl Database {
    /// Insert a new job in `created` status
    pub async fn insert_job(&self, job: &NewJob) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO jobs (id, submission_ref, requestor_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.submission_ref)
        .bind(&job.requestor_id)
        .bind(JobStatus::Created.to_i32())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert job: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Get a job by ID
    pub async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            SELECT
                id, submission_ref, requestor_id, status, reply_count,
                failure_reason, output_ref, created_at, started_at, finished_at
            FROM jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get job: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List jobs in the given status, oldest first
    pub async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(
            r#"
            SELECT
                id, submission_ref, requestor_id, status, reply_count,
                failure_reason, output_ref, created_at, started_at, finished_at
            FROM jobs
            WHERE status = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(status.to_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list jobs: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Move a job from `created` to `ongoing` and stamp `started_at`
    pub async fn start_job(&self, id: &JobId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, started_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(JobStatus::Ongoing.to_i32())
        .bind(now)
        .bind(id)
        .bind(JobStatus::Created.to_i32())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to start job: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Ongoing).await);
        }

        Ok(())
    }

    /// Record the reply count of an `ongoing` job
    pub async fn record_reply_count(&self, id: &JobId, reply_count: i64) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET reply_count = ? WHERE id = ? AND status = ?")
            .bind(reply_count)
            .bind(id)
            .bind(JobStatus::Ongoing.to_i32())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to record reply count: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Ongoing).await);
        }

        Ok(())
    }

    /// Finalize an `ongoing` job as `success` with the name of its written artifact
    pub async fn finalize_success(&self, id: &JobId, output_ref: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, output_ref = ?, finished_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(JobStatus::Success.to_i32())
        .bind(output_ref)
        .bind(now)
        .bind(id)
        .bind(JobStatus::Ongoing.to_i32())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to finalize job: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Success).await);
        }

        Ok(())
    }

    /// Finalize a job as `failure` with the given reason
    pub async fn finalize_failure(&self, id: &JobId, reason: FailureReason) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, failure_reason = ?, finished_at = ?
            WHERE id = ? AND status IN (?, ?)
            "#,
        )
        .bind(JobStatus::Failure.to_i32())
        .bind(reason.as_str())
        .bind(now)
        .bind(id)
        .bind(JobStatus::Created.to_i32())
        .bind(JobStatus::Ongoing.to_i32())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to finalize job: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Failure).await);
        }

        Ok(())
    }

    /// Fail every job a previous process left in `created` or `ongoing`
    ///
    /// Returns the number of jobs finalized.
    pub async fn fail_interrupted_jobs(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, failure_reason = ?, finished_at = ?
            WHERE status IN (?, ?)
            "#,
        )
        .bind(JobStatus::Failure.to_i32())
        .bind(FailureReason::Unknown.as_str())
        .bind(now)
        .bind(JobStatus::Created.to_i32())
        .bind(JobStatus::Ongoing.to_i32())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to fail interrupted jobs: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }

    /// Timing samples of the most recently finished successful jobs
    pub async fn recent_eta_samples(&self, limit: u32) -> Result<Vec<EtaSample>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT started_at, finished_at, reply_count
            FROM jobs
            WHERE status = ?
              AND started_at IS NOT NULL
              AND finished_at IS NOT NULL
              AND reply_count IS NOT NULL
            ORDER BY finished_at DESC
            LIMIT ?
            "#,
        )
        .bind(JobStatus::Success.to_i32())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to query eta samples: {}",
                e
            )))
        })?;

        Ok(rows
            .into_iter()
            .map(|(started_at, finished_at, reply_count)| EtaSample {
                started_at,
                finished_at,
                reply_count,
            })
            .collect())
    }

    /// Build the error for a conditional update that matched no row
    async fn rejected_transition(&self, id: &JobId, target: JobStatus) -> Error {
        match self.get_job(id).await {
            Ok(Some(job)) => Error::InvalidTransition {
                id: id.clone(),
                target: target.to_string(),
                current: job.status().to_string(),
            },
            Ok(None) => Error::JobNotFound(id.clone()),
            Err(e) => e,
        }
    }
}
