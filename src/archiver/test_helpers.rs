//! Shared test helpers for creating Archiver instances in tests.

use crate::archiver::Archiver;
use crate::config::Config;
use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::tree::tests::{reply, root_item};
use crate::types::{Credential, JobId, JobStatus, ReplyRecord, RootItem, StatusLabel};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

/// Session key with a stored credential in every test archiver
pub(crate) const SESSION: &str = "session-1";

/// Scriptable in-memory [`Fetcher`]
pub(crate) struct MockFetcher {
    root: Result<RootItem, FetchError>,
    replies: Result<Vec<ReplyRecord>, FetchError>,
    /// When set, `fetch_replies` waits for a notification before answering
    gate: Option<Arc<Notify>>,
    panic_on_replies: bool,
    pub(crate) calls: AtomicUsize,
}

impl MockFetcher {
    /// A thread whose root announces `replies.len()` replies
    pub(crate) fn thread(replies: Vec<ReplyRecord>) -> Self {
        let mut root = root_item();
        root.reply_count = replies.len() as i64;
        Self {
            root: Ok(root),
            replies: Ok(replies),
            gate: None,
            panic_on_replies: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Three replies: `c1` and `c2` top-level, `c3` under `c2`
    pub(crate) fn small_thread() -> Self {
        Self::thread(vec![
            reply("c1", "t3_root"),
            reply("c2", "t3_root"),
            reply("c3", "c2"),
        ])
    }

    /// Root lookup fails with `error`
    pub(crate) fn failing_root(error: FetchError) -> Self {
        Self {
            root: Err(error),
            ..Self::small_thread()
        }
    }

    /// Root lookup succeeds, reply download fails with `error`
    pub(crate) fn failing_replies(error: FetchError) -> Self {
        Self {
            replies: Err(error),
            ..Self::small_thread()
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panic_on_replies: true,
            ..Self::small_thread()
        }
    }

    /// Hold `fetch_replies` until `gate` is notified
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_root(
        &self,
        _submission_id: &str,
        _credential: &Credential,
    ) -> Result<RootItem, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.root.clone()
    }

    async fn fetch_replies(
        &self,
        _root: &RootItem,
        _credential: &Credential,
    ) -> Result<Vec<ReplyRecord>, FetchError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panic_on_replies {
            panic!("reply decoder blew up");
        }
        self.replies.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Test config rooted in `dir`
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("test.db");
    config.archive.output_dir = dir.join("output");
    config.archive.max_concurrent_jobs = 2;
    config
}

/// Helper to create a test Archiver instance with a persistent database and
/// a stored credential for [`SESSION`].
/// Returns the archiver and the tempdir (which must be kept alive).
pub(crate) async fn create_test_archiver(fetcher: MockFetcher) -> (Archiver, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let archiver = create_archiver_with(config, Arc::new(fetcher)).await;
    (archiver, temp_dir)
}

/// Like [`create_test_archiver`] with a caller-built config; the caller keeps
/// its handle on the fetcher to inspect calls
pub(crate) async fn create_archiver_with(config: Config, fetcher: Arc<MockFetcher>) -> Archiver {
    let archiver = Archiver::with_fetcher(config, fetcher)
        .await
        .unwrap();
    archiver
        .db
        .store_credential(SESSION, &Credential::new("refresh-token"))
        .await
        .unwrap();
    archiver
}

/// Poll until the job's stored status satisfies `done`, panicking after 5 seconds
pub(crate) async fn wait_for_status(
    archiver: &Archiver,
    job_id: &JobId,
    done: impl Fn(JobStatus) -> bool,
) -> JobStatus {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(job) = archiver.db.get_job(job_id).await.unwrap() {
            if done(job.status()) {
                return job.status();
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not reach the expected status in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Wait until the job is terminal
pub(crate) async fn wait_for_terminal(archiver: &Archiver, job_id: &JobId) -> JobStatus {
    wait_for_status(archiver, job_id, |s| s.is_terminal()).await
}

/// Status label of a job, for terse assertions
pub(crate) async fn label(archiver: &Archiver, job_id: &JobId) -> StatusLabel {
    archiver.status(job_id).await.unwrap().status
}
