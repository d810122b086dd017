//! # thread-archiver
//!
//! Archives nested discussion threads into self-contained, navigable HTML
//! documents.
//!
//! A submission reference is turned into an archive **job**. The job's
//! pipeline fetches the submission and its complete reply set from the
//! provider, assembles the replies into a tree, renders the tree as a single
//! document and writes it to the output directory. Callers poll the job's
//! status (with a remaining-time estimate) and finally download the artifact.
//!
//! ## Quick Start
//!
//! ```no_run
//! use thread_archiver::{Archiver, Config, Credential, StatusLabel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archiver = Archiver::new(Config::default()).await?;
//!
//!     // A request layer stores the provider credential once per session
//!     archiver
//!         .db
//!         .store_credential("session-key", &Credential::new("refresh-token"))
//!         .await?;
//!
//!     let job_id = archiver
//!         .submit("https://www.reddit.com/r/rust/comments/abc123/", "session-key")
//!         .await?;
//!
//!     loop {
//!         let status = archiver.status(&job_id).await?;
//!         match status.status {
//!             StatusLabel::Success => break,
//!             StatusLabel::Failure | StatusLabel::NotFound => {
//!                 eprintln!("{}", status.error_message.unwrap_or_default());
//!                 return Ok(());
//!             }
//!             _ => tokio::time::sleep(std::time::Duration::from_secs(1)).await,
//!         }
//!     }
//!
//!     let document = archiver.artifact(&job_id).await?;
//!     println!("{} bytes", document.map(|d| d.len()).unwrap_or(0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Job orchestration (decomposed into focused submodules)
pub mod archiver;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Remaining-time estimation
pub mod eta;
/// Provider access
pub mod fetcher;
/// Document rendering
pub mod render;
/// Retry logic with exponential backoff
pub mod retry;
/// Reply tree assembly
pub mod tree;
/// Core types
pub mod types;
/// Submission reference parsing and artifact naming
pub mod utils;

// Re-export commonly used types
pub use archiver::Archiver;
pub use config::Config;
pub use db::{CredentialStore, Database};
pub use error::{
    DatabaseError, Error, FetchError, HierarchyError, RenderError, Result, ToHttpStatus,
};
pub use fetcher::{FetchedSubmission, Fetcher, RedditFetcher};
pub use tree::Hierarchy;
pub use types::{
    Credential, FailureReason, JobId, JobStatus, ReplyRecord, RootItem, StatusLabel, StatusResult,
};

/// Helper function to run the archiver with graceful signal handling.
///
/// Waits for a termination signal and then calls the archiver's `shutdown()` method,
/// which lets in-flight jobs finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use thread_archiver::{Archiver, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let archiver = Archiver::new(Config::default()).await?;
///     let _estimator = archiver.start_rate_estimator();
///
///     // Run with automatic signal handling
///     run_with_shutdown(archiver).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(archiver: Archiver) -> Result<()> {
    wait_for_signal().await;
    archiver.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
