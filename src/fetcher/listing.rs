//! Provider wire format and reply flattening.
//!
//! Listings nest replies inside replies; [`ReplyCollector`] flattens them with
//! an explicit stack, queues "more" stubs for expansion and finally orders the
//! records so that every parent precedes its children.

use crate::error::FetchError;
use crate::types::{Distinguished, Edited, ReplyRecord, RootItem};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Author/body placeholder the provider uses for removed content
const DELETED_MARKER: &str = "[deleted]";

/// A `{kind, data}` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkData {
    pub name: String,
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvote_ratio: f64,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub spoiler: bool,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub is_original_content: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub created_utc: f64,
}

impl From<LinkData> for RootItem {
    fn from(link: LinkData) -> Self {
        RootItem {
            id: link.name,
            community: link.subreddit,
            title: link.title,
            permalink: link.permalink,
            author: author_name(link.author),
            body: link.selftext,
            reply_count: link.num_comments,
            score: link.score,
            upvote_ratio: link.upvote_ratio,
            flair: link.link_flair_text,
            stickied: link.stickied,
            spoiler: link.spoiler,
            nsfw: link.over_18,
            original_content: link.is_original_content,
            locked: link.locked,
            created_at: link.created_utc as i64,
        }
    }
}

/// `edited` is `false` or the edit timestamp
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EditedField {
    Flag(bool),
    At(f64),
}

impl Default for EditedField {
    fn default() -> Self {
        EditedField::Flag(false)
    }
}

impl From<EditedField> for Edited {
    fn from(field: EditedField) -> Self {
        match field {
            EditedField::Flag(false) => Edited::Never,
            EditedField::Flag(true) => Edited::Flagged,
            EditedField::At(ts) => Edited::At(ts as i64),
        }
    }
}

/// `replies` is an empty string when there are none
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Replies {
    Listing(Listing),
    Empty(serde_json::Value),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(serde_json::Value::Null)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentData {
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub distinguished: Option<String>,
    #[serde(default)]
    pub edited: EditedField,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub is_submitter: bool,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub replies: Replies,
}

impl CommentData {
    /// Split into the flat record and its nested replies
    fn into_parts(self) -> (ReplyRecord, Vec<Thing>) {
        let children = match self.replies {
            Replies::Listing(listing) => listing.data.children,
            Replies::Empty(_) => Vec::new(),
        };
        let body = self.body.filter(|b| b != DELETED_MARKER);

        let record = ReplyRecord {
            id: self.name,
            parent_id: self.parent_id,
            author: author_name(self.author),
            body,
            distinguished: Distinguished::from_provider(self.distinguished.as_deref()),
            edited: self.edited.into(),
            permalink: self.permalink,
            is_submitter: self.is_submitter,
            score: self.score,
            created_at: self.created_utc as i64,
        };

        (record, children)
    }
}

/// A "load more" stub
#[derive(Debug, Deserialize)]
pub(crate) struct MoreData {
    pub parent_id: String,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn author_name(author: Option<String>) -> Option<String> {
    author.filter(|a| a != DELETED_MARKER)
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::provider(format!("malformed {what}: {e}")))
}

/// Extract the root item from the first listing of a response
pub(crate) fn root_from_listing(listing: Listing, submission: &str) -> Result<RootItem, FetchError> {
    let thing = listing
        .data
        .children
        .into_iter()
        .find(|t| t.kind == "t3")
        .ok_or_else(|| FetchError::SubmissionNotFound {
            submission: submission.to_string(),
        })?;

    let link: LinkData = decode(thing.data, "submission")?;
    Ok(link.into())
}

/// A continuation the collector could not resolve from the data it has
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pending {
    /// Ids to expand through the "more children" endpoint
    More(Vec<String>),
    /// "Continue this thread": re-read the thread focused on this parent
    Continue(String),
}

/// Accumulates replies across listing pages and expansions
#[derive(Debug, Default)]
pub(crate) struct ReplyCollector {
    records: Vec<ReplyRecord>,
    seen: HashSet<String>,
    requested: HashSet<String>,
    continued: HashSet<String>,
    pending: VecDeque<Pending>,
}

impl ReplyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten things (and their nested replies) into the collector
    ///
    /// Already seen replies are skipped, but their nested replies are still
    /// walked since a focused re-read returns the known parent with new children.
    pub fn absorb(&mut self, things: Vec<Thing>) -> Result<(), FetchError> {
        let mut stack: Vec<Thing> = things.into_iter().rev().collect();

        while let Some(thing) = stack.pop() {
            match thing.kind.as_str() {
                "t1" => {
                    let comment: CommentData = decode(thing.data, "reply")?;
                    let (record, children) = comment.into_parts();
                    stack.extend(children.into_iter().rev());
                    if self.seen.insert(record.id.clone()) {
                        self.records.push(record);
                    }
                }
                "more" => {
                    let more: MoreData = decode(thing.data, "continuation")?;
                    self.queue_more(more);
                }
                other => {
                    tracing::debug!(kind = other, "ignoring unexpected listing entry");
                }
            }
        }

        Ok(())
    }

    fn queue_more(&mut self, more: MoreData) {
        if more.children.is_empty() {
            if self.continued.insert(more.parent_id.clone()) {
                self.pending.push_back(Pending::Continue(more.parent_id));
            }
            return;
        }

        let ids: Vec<String> = more
            .children
            .into_iter()
            .filter(|id| {
                let fullname = format!("t1_{id}");
                !self.seen.contains(&fullname) && self.requested.insert(id.clone())
            })
            .collect();

        if !ids.is_empty() {
            self.pending.push_back(Pending::More(ids));
        }
    }

    /// Next continuation to resolve
    pub fn next_pending(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    /// Number of distinct replies collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Order records so each parent precedes its children
    ///
    /// Siblings keep the order they were collected in. Records whose parent
    /// never showed up are appended at the end, where the tree builder rejects them.
    pub fn into_ordered(self, root_id: &str) -> Vec<ReplyRecord> {
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, record) in self.records.iter().enumerate() {
            children.entry(record.parent_id.as_str()).or_default().push(i);
        }

        let mut order = Vec::with_capacity(self.records.len());
        let mut placed = vec![false; self.records.len()];
        let mut stack: Vec<usize> = children
            .get(root_id)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(i) = stack.pop() {
            if placed[i] {
                continue;
            }
            placed[i] = true;
            order.push(i);
            if let Some(kids) = children.get(self.records[i].id.as_str()) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        let orphans: Vec<usize> = (0..self.records.len()).filter(|&i| !placed[i]).collect();
        if !orphans.is_empty() {
            tracing::warn!(count = orphans.len(), "replies without a reachable parent");
        }
        order.extend(orphans);

        let mut slots: Vec<Option<ReplyRecord>> = self.records.into_iter().map(Some).collect();
        order.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}
