//! Shutdown coordination.

use crate::error::Result;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::Archiver;

/// How long shutdown waits for in-flight jobs
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl Archiver {
    /// Gracefully shut down the archiver
    ///
    /// 1. Stops accepting new submissions
    /// 2. Waits for in-flight jobs to reach a terminal state (30 seconds at most)
    ///
    /// Jobs still running after the timeout are failed on the next startup.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new submissions");

        self.tasks.close();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.tasks.wait()).await {
            Ok(()) => {
                tracing::info!("All in-flight jobs completed");
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tasks.len(),
                    "Timeout waiting for jobs to complete, proceeding with shutdown"
                );
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Number of jobs whose pipeline task has not finished yet
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}
