//! Submission validation and job creation.

use crate::db::NewJob;
use crate::error::{Error, Result};
use crate::types::JobId;
use crate::utils::extract_submission_id;
use std::sync::atomic::Ordering;

use super::Archiver;

impl Archiver {
    /// Submit a submission reference for archiving
    ///
    /// Validates the reference and the requestor's stored credential, records
    /// a `created` job and starts its pipeline in the background. Returns as
    /// soon as the job row exists; the outcome is only observable through
    /// [`status`](Archiver::status).
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Archiver::shutdown) has begun
    /// - [`Error::BadUrl`] when the reference is not a submission link or id
    /// - [`Error::MissingCredential`] when the requestor never authorized the provider
    ///
    /// No job is created in any of these cases.
    pub async fn submit(&self, submission_ref: &str, requestor_id: &str) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let submission_id = extract_submission_id(submission_ref)?;

        let credential = self
            .credentials
            .lookup(requestor_id)
            .await?
            .ok_or_else(|| Error::MissingCredential(requestor_id.to_string()))?;

        let job = NewJob {
            id: JobId::generate(),
            submission_ref: submission_id.clone(),
            requestor_id: requestor_id.to_string(),
        };
        self.db.insert_job(&job).await?;

        tracing::info!(
            job_id = %job.id,
            submission = %submission_id,
            "Archive job created"
        );

        self.spawn_job(job.id.clone(), submission_id, credential);

        Ok(job.id)
    }
}
