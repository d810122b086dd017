//! The per-job pipeline: fetch, build, render, persist.
//!
//! Every job runs as its own task on the archiver's [`TaskTracker`]. Nothing
//! escapes a job: errors and panics alike end in exactly one terminal update
//! of the job row.
//!
//! [`TaskTracker`]: tokio_util::task::TaskTracker

use crate::error::{Error, Result};
use crate::render::{RenderOptions, render_document};
use crate::retry::with_retry;
use crate::tree::Hierarchy;
use crate::types::{Credential, FailureReason, JobId};
use crate::utils::artifact_filename;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use super::Archiver;

impl Archiver {
    /// Start the pipeline of a freshly created job in the background
    pub(crate) fn spawn_job(&self, job_id: JobId, submission_id: String, credential: Credential) {
        let archiver = self.clone();
        self.tasks.spawn(async move {
            archiver.run_job(job_id, submission_id, credential).await;
        });
    }

    /// Run one job to its terminal state
    ///
    /// Waits for a pipeline slot first; the job stays `created` meanwhile.
    pub(crate) async fn run_job(&self, job_id: JobId, submission_id: String, credential: Credential) {
        let _permit = match self.concurrent_limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Pipeline slots closed");
                self.record_failure(&job_id, FailureReason::Unknown).await;
                return;
            }
        };

        let outcome = AssertUnwindSafe(self.archive(&job_id, &submission_id, &credential))
            .catch_unwind()
            .await;

        let reason = match outcome {
            Ok(Ok(output_ref)) => {
                tracing::info!(
                    job_id = %job_id,
                    output = %output_ref,
                    "Archive job succeeded"
                );
                return;
            }
            Ok(Err(e)) => {
                let reason = FailureReason::from_error(&e);
                tracing::error!(
                    job_id = %job_id,
                    submission = %submission_id,
                    error = %e,
                    reason = %reason,
                    "Archive job failed"
                );
                reason
            }
            Err(panic) => {
                tracing::error!(
                    job_id = %job_id,
                    submission = %submission_id,
                    panic = %panic_message(panic.as_ref()),
                    "Archive job panicked"
                );
                FailureReason::Unknown
            }
        };

        self.record_failure(&job_id, reason).await;
    }

    /// The pipeline proper; returns the artifact name on success
    async fn archive(
        &self,
        job_id: &JobId,
        submission_id: &str,
        credential: &Credential,
    ) -> Result<String> {
        self.db.start_job(job_id).await?;
        tracing::debug!(
            job_id = %job_id,
            fetcher = self.fetcher.name(),
            "Archive job started"
        );

        let snapshot_at = Utc::now();

        let root = with_retry(&self.config.retry, || {
            self.fetcher.fetch_root(submission_id, credential)
        })
        .await?;

        // Recorded before the long part so status queries can project an ETA
        self.db.record_reply_count(job_id, root.reply_count).await?;
        tracing::debug!(
            job_id = %job_id,
            reply_count = root.reply_count,
            "Submission found"
        );

        let replies = with_retry(&self.config.retry, || {
            self.fetcher.fetch_replies(&root, credential)
        })
        .await?;
        tracing::debug!(
            job_id = %job_id,
            replies = replies.len(),
            "Replies downloaded"
        );

        let filename = artifact_filename(&root.community, &root.permalink, snapshot_at);
        let options = RenderOptions::from_config(&self.config, snapshot_at);

        let document = tokio::task::spawn_blocking(move || -> Result<String> {
            let tree = Hierarchy::build(root, replies)?;
            Ok(render_document(&tree, &options)?)
        })
        .await
        .map_err(|e| Error::Other(format!("Render task failed: {}", e)))??;

        let path = self.config.archive.output_dir.join(&filename);
        tokio::fs::write(&path, document.as_bytes())
            .await
            .map_err(|source| Error::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(
            job_id = %job_id,
            path = %path.display(),
            bytes = document.len(),
            "Artifact written"
        );

        if let Err(e) = self.db.finalize_success(job_id, &filename).await {
            // An artifact without a successful job can never be downloaded
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::error!(
                    job_id = %job_id,
                    path = %path.display(),
                    error = %remove_err,
                    "Failed to remove artifact of unrecorded job"
                );
            }
            return Err(e);
        }

        Ok(filename)
    }

    async fn record_failure(&self, job_id: &JobId, reason: FailureReason) {
        if let Err(e) = self.db.finalize_failure(job_id, reason).await {
            tracing::error!(
                job_id = %job_id,
                reason = %reason,
                error = %e,
                "Failed to record job failure"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
