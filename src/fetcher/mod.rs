//! Provider access
//!
//! The [`Fetcher`] trait is the only seam between the archive pipeline and
//! the remote provider. [`RedditFetcher`] is the production implementation;
//! tests substitute their own.

mod listing;
mod reddit;

pub use reddit::RedditFetcher;

use crate::error::FetchError;
use crate::types::{Credential, ReplyRecord, RootItem};
use async_trait::async_trait;

/// A fully fetched submission
#[derive(Clone, Debug)]
pub struct FetchedSubmission {
    /// The root item
    pub root: RootItem,
    /// Reply count announced by the provider
    pub reply_count: i64,
    /// Every reply, each parent ahead of its children, siblings in display order
    pub replies: Vec<ReplyRecord>,
}

/// Abstraction over the content provider, enabling testability
///
/// Implementations resolve every "load more" continuation before returning
/// replies, and never retry internally.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the root item of a submission
    async fn fetch_root(
        &self,
        submission_id: &str,
        credential: &Credential,
    ) -> Result<RootItem, FetchError>;

    /// Fetch the complete, flattened reply set of a root item
    async fn fetch_replies(
        &self,
        root: &RootItem,
        credential: &Credential,
    ) -> Result<Vec<ReplyRecord>, FetchError>;

    /// Fetch root and replies in one call
    async fn fetch(
        &self,
        submission_id: &str,
        credential: &Credential,
    ) -> Result<FetchedSubmission, FetchError> {
        let root = self.fetch_root(submission_id, credential).await?;
        let replies = self.fetch_replies(&root, credential).await?;
        Ok(FetchedSubmission {
            reply_count: root.reply_count,
            root,
            replies,
        })
    }

    /// Name of this implementation (for logging)
    fn name(&self) -> &'static str;
}
