//! Text helpers for document output: escaping, markdown bodies, timestamps.

use chrono::{DateTime, Utc};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use std::fmt::Write;

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a markdown body into HTML
///
/// Raw HTML in the source is shown as text, never passed through. Single
/// newlines become `<br>` and links with a script-capable scheme are
/// neutralised. Returns an empty string for an empty body.
pub fn format_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let events = Parser::new_ext(&normalized, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::SoftBreak => Event::HardBreak,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });

    let mut rendered = String::with_capacity(normalized.len() * 3 / 2);
    html::push_html(&mut rendered, events);
    compact_blocks(&rendered)
}

fn is_safe_url(url: &str) -> bool {
    let lowered = url.trim().to_ascii_lowercase();
    !["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

/// Drop the newlines the HTML writer puts after tags
///
/// Text content never holds a bare `>` (it is escaped), so a newline right
/// after `>` always follows markup. Newlines inside code blocks are kept.
fn compact_blocks(rendered: &str) -> String {
    let rendered = rendered.replace("<br />\n", "<br>");
    let mut out = String::with_capacity(rendered.len());
    let mut previous = None;

    for c in rendered.chars() {
        if c == '\n' && previous == Some('>') {
            continue;
        }
        out.push(c);
        previous = Some(c);
    }

    out.truncate(out.trim_end().len());
    out
}

/// Format a Unix timestamp with a strftime pattern, in UTC
///
/// Falls back to RFC 3339 when the pattern is invalid or the timestamp is out of range.
pub fn format_timestamp(timestamp: i64, pattern: &str) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => format_datetime(&dt, pattern),
        None => timestamp.to_string(),
    }
}

/// Format a UTC datetime with a strftime pattern, falling back to RFC 3339
pub fn format_datetime(dt: &DateTime<Utc>, pattern: &str) -> String {
    let mut out = String::new();
    // chrono reports unknown specifiers as fmt::Error
    if write!(out, "{}", dt.format(pattern)).is_err() {
        return dt.to_rfc3339();
    }
    out
}
