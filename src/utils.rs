//! Submission reference parsing and artifact naming

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Longest slug kept in an artifact filename, in characters
pub const MAX_SLUG_LEN: usize = 150;

/// Longest community name kept in an artifact filename, in characters
pub const MAX_COMMUNITY_LEN: usize = 21;

/// Accepted submission reference shapes, tried in order
///
/// 1. bare id, optionally followed by `/`
/// 2. short link `https://www.reddit.com/<id>`
/// 3. permalink `https://www.reddit.com/r/<community>/comments/<id>/...`
const SUBMISSION_PATTERNS: [&str; 3] = [
    r"^([a-z0-9]+)/?$",
    r"^https?://(?:old|new|www)?\.reddit\.com/([a-z0-9]+)/?$",
    r"^https?://(?:old|new|www)?\.reddit\.com/r/[a-zA-Z0-9\-_]+/comments/([a-z0-9]+)/?",
];

static SUBMISSION_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SUBMISSION_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Extract the provider submission id from a user-supplied reference
///
/// # Errors
/// Returns [`Error::BadUrl`] when the input matches none of the accepted shapes
///
/// # Examples
///
/// ```
/// use thread_archiver::utils::extract_submission_id;
///
/// let id = extract_submission_id("https://old.reddit.com/r/rust/comments/abc123/some_title/").unwrap();
/// assert_eq!(id, "abc123");
/// assert!(extract_submission_id("https://example.com/abc123").is_err());
/// ```
pub fn extract_submission_id(input: &str) -> Result<String> {
    let input = input.trim();
    SUBMISSION_REGEXES
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::BadUrl(input.to_string()))
}

/// Slug of a permalink: its last non-empty path segment, made filename-safe
///
/// Characters outside `[A-Za-z0-9_-]` are dropped and the result is cut to
/// [`MAX_SLUG_LEN`] characters.
pub fn permalink_slug(permalink: &str) -> String {
    let segment = permalink
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    filename_safe(segment, MAX_SLUG_LEN)
}

/// Name of the output artifact for a submission snapshot
///
/// `{community}-{slug}-{YYYYmmdd-HHMMSS}.html`, timestamp in UTC. The
/// community is filtered like the slug, so the name never leaves the
/// output directory.
pub fn artifact_filename(community: &str, permalink: &str, snapshot_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.html",
        filename_safe(community, MAX_COMMUNITY_LEN),
        permalink_slug(permalink),
        snapshot_at.format("%Y%m%d-%H%M%S")
    )
}

fn filename_safe(text: &str, limit: usize) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(limit)
        .collect()
}
