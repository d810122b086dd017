//! Error types for thread-archiver
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (database, provider fetch, hierarchy, rendering)
//! - HTTP status code mapping for whatever request layer embeds the library
//! - The mapping from pipeline errors to the persisted failure taxonomy

use crate::types::{FailureReason, JobId};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for thread-archiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for thread-archiver
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Provider fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Reply records could not be assembled into a single-rooted tree
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Document rendering failed
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The submitted reference is not a valid submission link or id
    #[error("invalid submission reference: {0}")]
    BadUrl(String),

    /// No provider credential is stored for the requestor
    #[error("no credential stored for requestor {0}")]
    MissingCredential(String),

    /// Job not found
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// A status transition was rejected because the job is not in a state that allows it
    #[error("job {id} cannot move to {target}: current status is {current}")]
    InvalidTransition {
        /// The job whose transition was rejected
        id: JobId,
        /// The requested status
        target: String,
        /// The status found in the store ("missing" if the row is gone)
        current: String,
    },

    /// Writing the output artifact failed
    #[error("failed to write artifact {path}: {source}")]
    ArtifactWrite {
        /// Path of the artifact that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Errors reported by a [`Fetcher`](crate::fetcher::Fetcher)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The root item no longer exists at the provider
    #[error("submission {submission} not found")]
    SubmissionNotFound {
        /// The submission reference that was requested
        submission: String,
    },

    /// The provider rejected the credential (expired or revoked authorization)
    #[error("provider rejected the credential: {0}")]
    AuthExpired(String),

    /// Any other transport or protocol fault
    #[error("provider error: {message}")]
    Provider {
        /// Description of the fault
        message: String,
        /// Whether the fault looks transient (timeout, connection reset, 5xx)
        transient: bool,
    },
}

impl FetchError {
    /// Build a non-transient provider fault
    pub fn provider(message: impl Into<String>) -> Self {
        FetchError::Provider {
            message: message.into(),
            transient: false,
        }
    }

    /// Build a transient provider fault
    pub fn transient(message: impl Into<String>) -> Self {
        FetchError::Provider {
            message: message.into(),
            transient: true,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let transient =
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error());
        FetchError::Provider {
            message: e.to_string(),
            transient,
        }
    }
}

/// Structural errors while assembling reply records into a tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// A reply references a parent that has not been inserted
    #[error("reply {id} references unknown parent {parent_id}")]
    OrphanReply {
        /// The reply that could not be attached
        id: String,
        /// The parent it references
        parent_id: String,
    },

    /// Two records share the same id (or a reply reuses the root id)
    #[error("duplicate node id {id}")]
    DuplicateReply {
        /// The repeated id
        id: String,
    },
}

/// Errors while serializing the hierarchy into a document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The hierarchy is nested deeper than the configured limit
    #[error("reply {id} is nested {depth} levels deep, limit is {limit}")]
    DepthExceeded {
        /// The first reply found beyond the limit
        id: String,
        /// Its depth
        depth: usize,
        /// The configured maximum depth
        limit: usize,
    },
}

impl FailureReason {
    /// Classify a pipeline error into the persisted failure taxonomy
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Fetch(FetchError::SubmissionNotFound { .. }) => FailureReason::SubmissionNotFound,
            Error::Fetch(FetchError::AuthExpired(_)) => FailureReason::BadAuthentication,
            Error::BadUrl(_) => FailureReason::BadUrl,
            Error::ArtifactWrite { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                FailureReason::BadPermissions
            }
            _ => FailureReason::Unknown,
        }
    }
}

/// Convert errors to HTTP status codes for an embedding request layer
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::BadUrl(_) => 400,

            // 401 Unauthorized - requestor must authorize the provider first
            Error::MissingCredential(_) => 401,
            Error::Fetch(FetchError::AuthExpired(_)) => 401,

            // 404 Not Found
            Error::JobNotFound(_) => 404,
            Error::Fetch(FetchError::SubmissionNotFound { .. }) => 404,

            // 409 Conflict - job is not in a state that allows the operation
            Error::InvalidTransition { .. } => 409,

            // 422 Unprocessable Entity - input too malformed or too deep to archive
            Error::Hierarchy(_) => 422,
            Error::Render(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ArtifactWrite { .. } => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Fetch(FetchError::Provider { .. }) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Fetch(e) => match e {
                FetchError::SubmissionNotFound { .. } => "submission_not_found",
                FetchError::AuthExpired(_) => "bad_authentication",
                FetchError::Provider { .. } => "provider_error",
            },
            Error::Hierarchy(e) => match e {
                HierarchyError::OrphanReply { .. } => "orphan_reply",
                HierarchyError::DuplicateReply { .. } => "duplicate_reply",
            },
            Error::Render(RenderError::DepthExceeded { .. }) => "depth_exceeded",
            Error::BadUrl(_) => "bad_url",
            Error::MissingCredential(_) => "missing_credential",
            Error::JobNotFound(_) => "job_not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::ArtifactWrite { .. } => "artifact_write_error",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Helpers: construct every Error variant for status/error_code tests
    // -----------------------------------------------------------------------

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("output_dir".into()),
                },
                400,
                "config_error",
            ),
            (Error::BadUrl("not a link".into()), 400, "bad_url"),
            (
                Error::MissingCredential("cookie".into()),
                401,
                "missing_credential",
            ),
            (
                Error::Fetch(FetchError::AuthExpired("invalid_grant".into())),
                401,
                "bad_authentication",
            ),
            (
                Error::JobNotFound(JobId::from("abc")),
                404,
                "job_not_found",
            ),
            (
                Error::Fetch(FetchError::SubmissionNotFound {
                    submission: "xyz".into(),
                }),
                404,
                "submission_not_found",
            ),
            (
                Error::InvalidTransition {
                    id: JobId::from("abc"),
                    target: "ongoing".into(),
                    current: "success".into(),
                },
                409,
                "invalid_transition",
            ),
            (
                Error::Hierarchy(HierarchyError::OrphanReply {
                    id: "t1_b".into(),
                    parent_id: "t1_a".into(),
                }),
                422,
                "orphan_reply",
            ),
            (
                Error::Hierarchy(HierarchyError::DuplicateReply { id: "t1_a".into() }),
                422,
                "duplicate_reply",
            ),
            (
                Error::Render(RenderError::DepthExceeded {
                    id: "t1_z".into(),
                    depth: 11,
                    limit: 10,
                }),
                422,
                "depth_exceeded",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("timeout".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ArtifactWrite {
                    path: PathBuf::from("/out/a.html"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk"),
                },
                500,
                "artifact_write_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::Fetch(FetchError::provider("bad json")),
                502,
                "provider_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn failure_reason_follows_taxonomy() {
        let cases = [
            (
                Error::Fetch(FetchError::SubmissionNotFound {
                    submission: "a".into(),
                }),
                FailureReason::SubmissionNotFound,
            ),
            (
                Error::Fetch(FetchError::AuthExpired("revoked".into())),
                FailureReason::BadAuthentication,
            ),
            (Error::BadUrl("x".into()), FailureReason::BadUrl),
            (
                Error::ArtifactWrite {
                    path: PathBuf::from("/out/a.html"),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                },
                FailureReason::BadPermissions,
            ),
            (
                Error::ArtifactWrite {
                    path: PathBuf::from("/out/a.html"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                },
                FailureReason::Unknown,
            ),
            (
                Error::Fetch(FetchError::transient("connection reset")),
                FailureReason::Unknown,
            ),
            (
                Error::Render(RenderError::DepthExceeded {
                    id: "t1_a".into(),
                    depth: 3,
                    limit: 2,
                }),
                FailureReason::Unknown,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(FailureReason::from_error(&error), expected, "{error:?}");
        }
    }

    #[tokio::test]
    async fn transport_errors_surface_as_provider_faults() {
        // nothing listens on port 1
        let err = reqwest::get("http://127.0.0.1:1/").await.unwrap_err();

        let error = Error::from(FetchError::from(err));
        assert!(
            matches!(
                error,
                Error::Fetch(FetchError::Provider {
                    transient: true,
                    ..
                })
            ),
            "{error:?}"
        );
        assert_eq!(error.status_code(), 502);
        assert_eq!(error.error_code(), "provider_error");
        assert_eq!(FailureReason::from_error(&error), FailureReason::Unknown);
    }

    #[test]
    fn display_includes_context() {
        let err = Error::InvalidTransition {
            id: JobId::from("job1"),
            target: "success".into(),
            current: "failure".into(),
        };
        assert_eq!(
            err.to_string(),
            "job job1 cannot move to success: current status is failure"
        );
    }
}
