//! Document serializer
//!
//! Walks a [`Hierarchy`] in pre-order with an explicit stack and emits one
//! self-contained HTML document. Each reply is an `<article>` container;
//! containers are closed by comparing the depth of the node being opened with
//! the depth of the previously opened one, so any number of levels can be
//! unwound in a single step.

mod template;
mod text;

pub use template::BAND_COLORS;
pub use text::{escape_html, format_body, format_datetime, format_timestamp};

use crate::config::Config;
use crate::error::RenderError;
use crate::tree::{Hierarchy, NodeId};
use crate::types::{Distinguished, ReplyRecord};
use chrono::{DateTime, Utc};
use std::fmt::Write;

const DELETED: &str = "(deleted)";

/// Everything the serializer needs besides the tree
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Deepest reply level accepted before failing with `DepthExceeded`
    pub max_depth: usize,
    /// Provider site root used for absolute author and permalink links
    pub web_root: String,
    /// strftime pattern for timestamps
    pub date_format: String,
    /// Sort order the replies were requested in
    pub sort: String,
    /// Moment the snapshot was taken
    pub snapshot_at: DateTime<Utc>,
    /// Application name for the footer line
    pub app_name: String,
    /// Application URL for the footer line
    pub app_url: String,
    /// Application version for the footer line
    pub app_version: String,
}

impl RenderOptions {
    /// Options derived from the runtime configuration
    pub fn from_config(config: &Config, snapshot_at: DateTime<Utc>) -> Self {
        Self {
            max_depth: config.archive.max_depth,
            web_root: config.provider.web_root.trim_end_matches('/').to_string(),
            date_format: config.archive.date_format.clone(),
            sort: config.provider.sort.clone(),
            snapshot_at,
            app_name: config.app.name.clone(),
            app_url: config.app.url.clone(),
            app_version: config.app.version.clone(),
        }
    }
}

/// Navigation anchors of one reply
///
/// `None` siblings are rendered as disabled links pointing nowhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLinks {
    /// Id of the parent node (a reply or the root item)
    pub parent: String,
    /// Id of the previous sibling
    pub previous: Option<String>,
    /// Id of the next sibling
    pub next: Option<String>,
}

/// Compute the navigation anchors of a non-root node
pub fn navigation(tree: &Hierarchy, id: NodeId) -> NavLinks {
    let node = tree.node(id);
    let parent = node
        .parent
        .map(|p| tree.node(p).id.clone())
        .unwrap_or_else(|| node.id.clone());

    NavLinks {
        parent,
        previous: tree.previous_sibling(id).map(|s| tree.node(s).id.clone()),
        next: tree.next_sibling(id).map(|s| tree.node(s).id.clone()),
    }
}

/// CSS classes of a reply container
///
/// Color class priority: admin, moderator, original poster, then even/odd by
/// depth. The `l{0-9}` band class is always present; `f` marks top-level replies.
pub fn classes_for(depth: usize, reply: &ReplyRecord) -> String {
    let mut classes = String::new();

    if depth == 1 {
        classes.push_str("f ");
    }

    classes.push_str(match reply.distinguished {
        Distinguished::Admin => "a",
        Distinguished::Moderator => "m",
        Distinguished::None if reply.is_submitter => "p",
        Distinguished::None if depth % 2 == 0 => "e",
        Distinguished::None => "o",
    });

    let _ = write!(classes, " l{}", depth % 10);
    classes
}

/// Serialize the hierarchy into a complete HTML document
pub fn render_document(tree: &Hierarchy, opts: &RenderOptions) -> Result<String, RenderError> {
    // Rough per-reply estimate to avoid repeated reallocation on large threads
    let mut out = String::with_capacity(4096 + tree.reply_count() * 512);

    write_head(&mut out, tree, opts);
    write_root(&mut out, tree, opts);
    out.push_str("<h3>Comments</h3>");
    write_replies(&mut out, tree, opts)?;
    out.push_str(template::NAVIGATION_SCRIPT);
    out.push_str("</body></html>");

    Ok(out)
}

fn write_head(out: &mut String, tree: &Hierarchy, opts: &RenderOptions) {
    let root = tree.root();
    let community = escape_html(&root.community);
    let title = escape_html(&root.title);

    let _ = write!(
        out,
        "<!doctype html><html><head><meta charset=\"utf-8\"/><title>{community} &ndash; {title}</title>\
         <style>{css}</style></head><body>",
        css = template::stylesheet(),
    );

    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    let _ = write!(
        out,
        "<h1><a href=\"{web}/r/{community}/\">/r/{community}</a> &ndash; \
         <a href=\"{web}{permalink}\">{title}</a></h1>\
         <h2>Snapshot taken on {snapshot}<br/>\
         Posts: {posts} &ndash; Score: {score} ({ratio}% upvoted) &ndash; Flair: {flair} &ndash; Sorted by: {sort}<br/>\
         Sticky: {sticky} &ndash; Spoiler: {spoiler} &ndash; NSFW: {nsfw} &ndash; OC: {oc} &ndash; Locked: {locked}</h2>\
         <p><em>Snapshot taken from <a href=\"{app_url}\">{app_name}</a> v{app_version}. All times are UTC.</em></p>",
        web = escape_html(&opts.web_root),
        permalink = escape_html(&root.permalink),
        snapshot = escape_html(&format_datetime(&opts.snapshot_at, &opts.date_format)),
        posts = root.reply_count,
        score = root.score,
        ratio = (root.upvote_ratio * 100.0) as i64,
        flair = escape_html(root.flair.as_deref().unwrap_or("None")),
        sort = escape_html(&opts.sort),
        sticky = yes_no(root.stickied),
        spoiler = yes_no(root.spoiler),
        nsfw = yes_no(root.nsfw),
        oc = yes_no(root.original_content),
        locked = yes_no(root.locked),
        app_url = escape_html(&opts.app_url),
        app_name = escape_html(&opts.app_name),
        app_version = escape_html(&opts.app_version),
    );
}

fn write_root(out: &mut String, tree: &Hierarchy, opts: &RenderOptions) {
    let root = tree.root();
    let author = escape_html(root.author.as_deref().unwrap_or(DELETED));

    let _ = write!(
        out,
        "<h3>Original post</h3><section class=\"p f l1\" id=\"{id}\"><header>\
         <a href=\"{web}/u/{author}\">{author}</a>, on {time}</header>{body}</section>",
        id = escape_html(&root.id),
        web = escape_html(&opts.web_root),
        time = escape_html(&format_timestamp(root.created_at, &opts.date_format)),
        body = format_body(&root.body),
    );
}

fn write_replies(out: &mut String, tree: &Hierarchy, opts: &RenderOptions) -> Result<(), RenderError> {
    let mut stack: Vec<NodeId> = tree.node(Hierarchy::ROOT).children.iter().rev().copied().collect();
    let mut previous_depth = 0usize;

    while let Some(id) = stack.pop() {
        let node = tree.node(id);

        if node.depth > opts.max_depth {
            return Err(RenderError::DepthExceeded {
                id: node.id.clone(),
                depth: node.depth,
                limit: opts.max_depth,
            });
        }

        if node.depth <= previous_depth {
            for _ in 0..(previous_depth - node.depth + 1) {
                out.push_str("</article>");
            }
        }

        if let Some(reply) = &node.reply {
            write_reply_open(out, tree, id, reply, opts);
        }

        previous_depth = node.depth;
        stack.extend(node.children.iter().rev().copied());
    }

    for _ in 0..previous_depth {
        out.push_str("</article>");
    }

    Ok(())
}

fn write_reply_open(
    out: &mut String,
    tree: &Hierarchy,
    id: NodeId,
    reply: &ReplyRecord,
    opts: &RenderOptions,
) {
    let node = tree.node(id);
    let nav = navigation(tree, id);
    let author = escape_html(reply.author.as_deref().unwrap_or(DELETED));
    let node_id = escape_html(&node.id);

    let sibling = |target: &Option<String>| match target {
        Some(s) => (format!("#{}", escape_html(s)), ""),
        None => ("#".to_string(), " D"),
    };
    let (previous_href, previous_disabled) = sibling(&nav.previous);
    let (next_href, next_disabled) = sibling(&nav.next);

    let _ = write!(
        out,
        "<article class=\"{classes}\" id=\"{node_id}\"><header>\
         <a href=\"{web}/u/{author}\">{author}</a>, on <a href=\"{web}{permalink}\">{time}</a> \
         ({score}{edited}) \
         <a href=\"#{parent}\" class=\"n P\">&#9635;</a> \
         <a href=\"{previous_href}\" class=\"n A{previous_disabled}\">&#8593;</a> \
         <a href=\"{next_href}\" class=\"n B{next_disabled}\">&#8595;</a> \
         <a href=\"#{node_id}\" class=\"n S\">&#9711;</a></header>{body}",
        classes = classes_for(node.depth, reply),
        web = escape_html(&opts.web_root),
        permalink = escape_html(&reply.permalink),
        time = escape_html(&format_timestamp(reply.created_at, &opts.date_format)),
        score = reply.score,
        edited = if reply.edited.is_edited() { ", edited" } else { "" },
        parent = escape_html(&nav.parent),
        body = format_body(reply.body.as_deref().unwrap_or(DELETED)),
    );
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
