//! Core types for thread-archiver

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a job id (22 URL-safe characters once encoded)
const JOB_ID_BYTES: usize = 16;

/// Opaque, unguessable identifier for an archive job
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh random job id
    pub fn generate() -> Self {
        let mut bytes = [0u8; JOB_ID_BYTES];
        rand::thread_rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for JobId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for JobId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for JobId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Job status
///
/// Transitions are monotonic: `Created → Ongoing → {Success, Failure}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Recorded, waiting to start
    Created,
    /// Pipeline running
    Ongoing,
    /// Artifact written
    Success,
    /// Terminated with a failure reason
    Failure,
}

impl JobStatus {
    /// Convert integer status code to JobStatus enum
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => JobStatus::Created,
            1 => JobStatus::Ongoing,
            2 => JobStatus::Success,
            3 => JobStatus::Failure,
            _ => JobStatus::Failure, // Default to Failure for unknown status
        }
    }

    /// Convert JobStatus enum to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            JobStatus::Created => 0,
            JobStatus::Ongoing => 1,
            JobStatus::Success => 2,
            JobStatus::Failure => 3,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }

    /// Lowercase label used in logs and status results
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Ongoing => "ongoing",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job ended in [`JobStatus::Failure`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The root item no longer exists at the provider
    SubmissionNotFound,
    /// The provider rejected the requestor's credential
    BadAuthentication,
    /// The reference could not be parsed into a submission id
    BadUrl,
    /// The output artifact could not be written because of access control
    BadPermissions,
    /// Anything else
    Unknown,
}

impl FailureReason {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::SubmissionNotFound => "SUBMISSION_NOT_FOUND",
            FailureReason::BadAuthentication => "BAD_AUTHENTICATION",
            FailureReason::BadUrl => "BAD_URL",
            FailureReason::BadPermissions => "BAD_PERMISSIONS",
            FailureReason::Unknown => "UNKNOWN",
        }
    }

    /// Parse the stored representation; unrecognized values map to `Unknown`
    pub fn parse(value: &str) -> Self {
        match value {
            "SUBMISSION_NOT_FOUND" => FailureReason::SubmissionNotFound,
            "BAD_AUTHENTICATION" => FailureReason::BadAuthentication,
            "BAD_URL" => FailureReason::BadUrl,
            "BAD_PERMISSIONS" => FailureReason::BadPermissions,
            _ => FailureReason::Unknown,
        }
    }

    /// User-facing explanation shown by status queries
    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::SubmissionNotFound => {
                "The submission could not be found. Please check if the submission (still) exists."
            }
            FailureReason::BadAuthentication => {
                "It looks like your account no longer allows this application to read on its behalf. Please authorize it again."
            }
            FailureReason::BadUrl => {
                "The link you provided is not a valid submission. Please check it and submit it again."
            }
            FailureReason::BadPermissions | FailureReason::Unknown => {
                "Your request cannot be completed because of an issue in the server. Please contact the administrator and tell them to look in the error logs."
            }
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-asserted special authority on a reply
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distinguished {
    /// Regular reply
    #[default]
    None,
    /// Posted as a community moderator
    Moderator,
    /// Posted as a site administrator
    Admin,
}

impl Distinguished {
    /// Parse the provider's `distinguished` field
    pub fn from_provider(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Distinguished::Admin,
            Some("moderator") => Distinguished::Moderator,
            _ => Distinguished::None,
        }
    }
}

/// Edit marker of a reply: the provider reports either a flag or an edit timestamp
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edited {
    /// Never edited
    #[default]
    Never,
    /// Edited, time unknown
    Flagged,
    /// Edited at this Unix timestamp
    At(i64),
}

impl Edited {
    /// Whether the reply was edited at all
    pub fn is_edited(&self) -> bool {
        !matches!(self, Edited::Never)
    }
}

/// One flat reply referencing its parent by id. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    /// Provider fullname of the reply (e.g. `t1_abc`)
    pub id: String,
    /// Fullname of the parent reply or of the root item
    pub parent_id: String,
    /// Author name, `None` when deleted
    pub author: Option<String>,
    /// Body text (provider markdown), `None` when deleted
    pub body: Option<String>,
    /// Special authority flag
    pub distinguished: Distinguished,
    /// Edit marker
    pub edited: Edited,
    /// Path of the reply on the provider site
    pub permalink: String,
    /// Whether the author also wrote the root item
    pub is_submitter: bool,
    /// Score at fetch time
    pub score: i64,
    /// Unix timestamp of creation
    pub created_at: i64,
}

/// The top-level content entity being archived (depth 0)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootItem {
    /// Provider fullname of the submission (e.g. `t3_abc`)
    pub id: String,
    /// Community the submission lives in
    pub community: String,
    /// Submission title
    pub title: String,
    /// Path of the submission on the provider site
    pub permalink: String,
    /// Author name, `None` when deleted
    pub author: Option<String>,
    /// Self text (may be empty for link posts)
    pub body: String,
    /// Reply count announced by the provider
    pub reply_count: i64,
    /// Score at fetch time
    pub score: i64,
    /// Fraction of votes that are upvotes (0.0-1.0)
    pub upvote_ratio: f64,
    /// Flair text
    pub flair: Option<String>,
    /// Pinned by moderators
    pub stickied: bool,
    /// Marked as spoiler
    pub spoiler: bool,
    /// Marked as not safe for work
    pub nsfw: bool,
    /// Marked as original content
    pub original_content: bool,
    /// Closed to new replies
    pub locked: bool,
    /// Unix timestamp of creation
    pub created_at: i64,
}

/// Provider credential stored for a session
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the raw secret (only to hand it to the provider)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Status label returned by status queries (adds `notfound` for unknown ids)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    /// Recorded, waiting to start
    Created,
    /// Pipeline running
    Ongoing,
    /// Artifact available
    Success,
    /// Terminated with a failure reason
    Failure,
    /// No job with this id
    NotFound,
}

impl From<JobStatus> for StatusLabel {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Created => StatusLabel::Created,
            JobStatus::Ongoing => StatusLabel::Ongoing,
            JobStatus::Success => StatusLabel::Success,
            JobStatus::Failure => StatusLabel::Failure,
        }
    }
}

/// Result of a status query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// Current status
    pub status: StatusLabel,
    /// Explanation, only set when `status == failure`
    pub error_message: Option<String>,
    /// Human-readable remaining-time projection, `None` until the reply count is known
    pub eta: Option<String>,
}

impl StatusResult {
    /// Result for an unknown job id
    pub fn not_found() -> Self {
        Self {
            status: StatusLabel::NotFound,
            error_message: None,
            eta: None,
        }
    }

    /// HTTP status code a request layer should answer with
    ///
    /// Jobs still in progress map to 409 so pollers keep waiting.
    pub fn http_status(&self) -> u16 {
        match self.status {
            StatusLabel::Created | StatusLabel::Ongoing => 409,
            StatusLabel::Failure | StatusLabel::NotFound => 404,
            StatusLabel::Success => 200,
        }
    }
}
