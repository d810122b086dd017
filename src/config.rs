//! Configuration types for thread-archiver

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Provider API settings (endpoints, application credentials, listing parameters)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth API root used for authenticated reads (default: "https://oauth.reddit.com")
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// Root used for the token exchange (default: "https://www.reddit.com")
    #[serde(default = "default_web_root")]
    pub auth_root: String,

    /// Public site root, used to build absolute links in archived documents
    #[serde(default = "default_web_root")]
    pub web_root: String,

    /// Application client id registered at the provider
    #[serde(default)]
    pub client_id: String,

    /// Application client secret (empty for installed apps)
    #[serde(default)]
    pub client_secret: String,

    /// User-Agent sent with every provider request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for a single provider request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Replies requested in the first listing page (default: 500)
    #[serde(default = "default_comment_limit")]
    pub comment_limit: u32,

    /// Maximum ids per expansion request (default: 100)
    #[serde(default = "default_more_children_batch")]
    pub more_children_batch: usize,

    /// Sort order requested from the provider (default: "confidence")
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            auth_root: default_web_root(),
            web_root: default_web_root(),
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            comment_limit: default_comment_limit(),
            more_children_batch: default_more_children_batch(),
            sort: default_sort(),
        }
    }
}

/// Archive output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory where rendered documents are written (default: "./output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Deepest reply level the renderer accepts (default: 10000)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum jobs running their pipeline at the same time (default: 4)
    ///
    /// Jobs waiting for a slot stay in `created`.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// strftime pattern for timestamps shown in documents
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_depth: default_max_depth(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            date_format: default_date_format(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./thread-archiver.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Remaining-time estimation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EtaConfig {
    /// Replies per second assumed before any job has succeeded (default: 30.0)
    #[serde(default = "default_rate")]
    pub default_rate: f64,

    /// Number of most recent successful jobs considered (default: 100)
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,

    /// How often the background estimator recomputes the rate (default: 24 hours)
    #[serde(default = "default_refresh_interval", with = "duration_serde")]
    pub refresh_interval: Duration,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            default_rate: default_rate(),
            sample_size: default_sample_size(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

/// Retry configuration for transient provider failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0, fail on first error)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Application identity shown in archived documents
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Public URL of the application
    #[serde(default)]
    pub url: String,

    /// Version string
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            url: String::new(),
            version: default_app_version(),
        }
    }
}

/// Housekeeping thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Artifacts older than this are deleted by `cleanup_artifacts` (default: 24 hours)
    #[serde(default = "default_artifact_max_age", with = "duration_serde")]
    pub artifact_max_age: Duration,

    /// Sessions idle longer than this are deleted by `cleanup_sessions` (default: 7760000 seconds)
    #[serde(default = "default_session_max_idle", with = "duration_serde")]
    pub session_max_idle: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            artifact_max_age: default_artifact_max_age(),
            session_max_idle: default_session_max_idle(),
        }
    }
}

/// Main configuration for [`Archiver`](crate::Archiver)
///
/// Every section has defaults, so `{}` is a valid configuration document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider endpoints and application credentials
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Output location and rendering limits
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Database location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Remaining-time estimation
    #[serde(default)]
    pub eta: EtaConfig,

    /// Provider retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Application identity
    #[serde(default)]
    pub app: AppConfig,

    /// Cleanup thresholds
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

fn default_api_root() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_web_root() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("thread-archiver/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_comment_limit() -> u32 {
    500
}

fn default_more_children_batch() -> usize {
    100
}

fn default_sort() -> String {
    "confidence".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_max_depth() -> usize {
    10_000
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./thread-archiver.db")
}

fn default_rate() -> f64 {
    30.0
}

fn default_sample_size() -> u32 {
    100
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_app_name() -> String {
    "thread-archiver".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_artifact_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_session_max_idle() -> Duration {
    Duration::from_secs(7_760_000)
}

// Serde helper for Duration (serialize as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
