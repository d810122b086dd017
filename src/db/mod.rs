//! Database layer for thread-archiver
//!
//! Handles SQLite persistence for archive jobs and requestor sessions.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`jobs`] — Job records and their status transitions
//! - [`sessions`] — Requestor sessions and stored provider credentials

use crate::Result;
use crate::types::{Credential, FailureReason, JobId, JobStatus};
use async_trait::async_trait;
use sqlx::{FromRow, sqlite::SqlitePool};

mod jobs;
mod migrations;
mod sessions;

/// New job to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Pre-generated job id
    pub id: JobId,
    /// Normalized submission id the job archives
    pub submission_ref: String,
    /// Session key of the requestor
    pub requestor_id: String,
}

/// Job record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Job {
    /// Unique job id
    pub id: JobId,
    /// Normalized submission id
    pub submission_ref: String,
    /// Session key of the requestor
    pub requestor_id: String,
    /// Current status code (see [`JobStatus::from_i32`])
    pub status: i32,
    /// Reply count announced by the provider, once known
    pub reply_count: Option<i64>,
    /// Failure reason code when `status` is failure
    pub failure_reason: Option<String>,
    /// File name of the written artifact when `status` is success
    pub output_ref: Option<String>,
    /// Unix timestamp when the job was created
    pub created_at: i64,
    /// Unix timestamp when the pipeline started
    pub started_at: Option<i64>,
    /// Unix timestamp when the job reached a terminal state
    pub finished_at: Option<i64>,
}

impl Job {
    /// Typed status
    pub fn status(&self) -> JobStatus {
        JobStatus::from_i32(self.status)
    }

    /// Typed failure reason
    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason.as_deref().map(FailureReason::parse)
    }
}

/// Session record from database
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    /// Session key handed out by the request layer
    pub id: String,
    /// Raw provider credential
    pub credential: String,
    /// Unix timestamp when the session was first stored
    pub created_at: i64,
    /// Unix timestamp of the last credential lookup
    pub last_seen_at: i64,
}

/// Repository giving the orchestrator access to requestor credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credential stored for a session key
    ///
    /// Returns `None` when the session is unknown.
    async fn lookup(&self, session_key: &str) -> Result<Option<Credential>>;
}

/// Database handle for thread-archiver
pub struct Database {
    pool: SqlitePool,
}
