//! Archive job orchestration split into focused submodules.
//!
//! The `Archiver` struct and its methods are organized by domain:
//! - [`submit`] - Submission validation and job creation
//! - [`orchestration`] - The per-job fetch, build, render and persist pipeline
//! - [`status`] - Status queries, ETA projection and artifact retrieval
//! - [`lifecycle`] - Shutdown coordination
//! - [`services`] - Background rate estimator
//! - [`maintenance`] - Artifact and session cleanup

mod lifecycle;
mod maintenance;
mod orchestration;
mod services;
mod status;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::{CredentialStore, Database};
use crate::error::{Error, Result};
use crate::eta::RateCell;
use crate::fetcher::{Fetcher, RedditFetcher};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

/// Main archiver instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Archiver {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public so a request layer can manage sessions and read job rows
    pub db: Arc<Database>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Provider access (trait object so tests can substitute it)
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Session key to provider credential lookup
    pub(crate) credentials: Arc<dyn CredentialStore>,
    /// Current replies-per-second estimate
    pub(crate) rate: RateCell,
    /// Tracks every spawned job so shutdown can wait for them
    pub(crate) tasks: TaskTracker,
    /// Flag to indicate whether new submissions are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Semaphore to limit concurrently running pipelines (respects max_concurrent_jobs config)
    pub(crate) concurrent_limit: Arc<Semaphore>,
}

impl Archiver {
    /// Create a new Archiver talking to the configured provider
    ///
    /// This initializes all core components:
    /// - Creates the output directory
    /// - Opens/creates the SQLite database and runs migrations
    /// - Fails jobs a previous process left unfinished
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = RedditFetcher::new(config.provider.clone())?;
        Self::with_fetcher(config, Arc::new(fetcher)).await
    }

    /// Create a new Archiver with a custom [`Fetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.archive.output_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory '{}': {}",
                        config.archive.output_dir.display(),
                        e
                    ),
                ))
            })?;

        if config.archive.max_concurrent_jobs == 0 {
            return Err(Error::Config {
                message: "max_concurrent_jobs must be at least 1".to_string(),
                key: Some("archive.max_concurrent_jobs".to_string()),
            });
        }

        let default_rate = config.eta.default_rate;
        if !default_rate.is_finite() || default_rate <= 0.0 {
            return Err(Error::Config {
                message: format!("default_rate must be a positive number, got {default_rate}"),
                key: Some("eta.default_rate".to_string()),
            });
        }

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        // Whatever was running when the previous process stopped will never finish
        let interrupted = db.fail_interrupted_jobs().await?;
        if interrupted > 0 {
            tracing::warn!(
                count = interrupted,
                "Marked jobs interrupted by a previous shutdown as failed"
            );
        }

        let concurrent_limit = Arc::new(Semaphore::new(config.archive.max_concurrent_jobs));
        let rate = RateCell::new(config.eta.default_rate);
        let credentials: Arc<dyn CredentialStore> = db.clone();

        tracing::info!(
            fetcher = fetcher.name(),
            output_dir = %config.archive.output_dir.display(),
            max_concurrent_jobs = config.archive.max_concurrent_jobs,
            "Archiver initialized"
        );

        Ok(Self {
            db,
            config: Arc::new(config),
            fetcher,
            credentials,
            rate,
            tasks: TaskTracker::new(),
            accepting_new: Arc::new(AtomicBool::new(true)),
            concurrent_limit,
        })
    }

    /// Replace the credential store (defaults to the archiver's own database)
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = store;
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
