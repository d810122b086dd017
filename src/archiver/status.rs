//! Status queries and artifact retrieval.

use crate::error::{Error, Result};
use crate::eta::project;
use crate::types::{JobId, JobStatus, StatusLabel, StatusResult};

use super::Archiver;

impl Archiver {
    /// Current status of a job
    ///
    /// Unknown ids report [`StatusLabel::NotFound`]. An ETA is only projected
    /// while the job is `ongoing` and its reply count is known; failures
    /// carry the message of their reason. Terminal jobs always answer the
    /// same result.
    pub async fn status(&self, job_id: &JobId) -> Result<StatusResult> {
        let Some(job) = self.db.get_job(job_id).await? else {
            return Ok(StatusResult::not_found());
        };

        let status = job.status();
        let error_message = match status {
            JobStatus::Failure => job.failure_reason().map(|r| r.message().to_string()),
            _ => None,
        };

        let eta = match (status, job.reply_count, job.started_at) {
            (JobStatus::Ongoing, Some(reply_count), Some(started_at)) => {
                let elapsed = chrono::Utc::now().timestamp() - started_at;
                Some(project(reply_count, self.rate.get(), elapsed).to_string())
            }
            _ => None,
        };

        Ok(StatusResult {
            status: StatusLabel::from(status),
            error_message,
            eta,
        })
    }

    /// Bytes of a successful job's artifact
    ///
    /// Returns `None` for unknown jobs, jobs that did not succeed, and
    /// artifacts that have since been removed by cleanup.
    pub async fn artifact(&self, job_id: &JobId) -> Result<Option<Vec<u8>>> {
        let Some(job) = self.db.get_job(job_id).await? else {
            return Ok(None);
        };

        let Some(output_ref) = job.output_ref.clone().filter(|_| job.status() == JobStatus::Success)
        else {
            return Ok(None);
        };

        let path = self.config.archive.output_dir.join(&output_ref);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(job_id = %job_id, path = %path.display(), "Artifact no longer on disk");
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
