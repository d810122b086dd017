//! Artifact and session cleanup, meant to be triggered periodically from outside.

use crate::error::{Error, Result};
use std::time::SystemTime;

use super::Archiver;

impl Archiver {
    /// Remove output documents older than `maintenance.artifact_max_age`
    ///
    /// Only `.html` files directly inside the output directory are
    /// considered. Returns how many were removed.
    pub async fn cleanup_artifacts(&self) -> Result<usize> {
        let max_age = self.config.maintenance.artifact_max_age;
        let now = SystemTime::now();
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.config.archive.output_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to read output directory '{}': {}",
                        self.config.archive.output_dir.display(),
                        e
                    ),
                ))
            })?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %path.display(), "Removed expired artifact");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove artifact");
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expired artifacts cleaned up");
        }
        Ok(removed)
    }

    /// Drop sessions idle for longer than `maintenance.session_max_idle`
    ///
    /// Returns how many were deleted.
    pub async fn cleanup_sessions(&self) -> Result<u64> {
        let max_idle = self.config.maintenance.session_max_idle.as_secs() as i64;
        let cutoff = chrono::Utc::now().timestamp() - max_idle;

        let deleted = self.db.delete_sessions_idle_since(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, "Idle sessions cleaned up");
        }
        Ok(deleted)
    }
}
