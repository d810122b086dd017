use super::*;
use crate::tree::tests::{reply, root_item};
use crate::types::Edited;
use chrono::TimeZone;

fn options() -> RenderOptions {
    RenderOptions {
        max_depth: 10_000,
        web_root: "https://www.reddit.com".to_string(),
        date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        sort: "confidence".to_string(),
        snapshot_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        app_name: "thread-archiver".to_string(),
        app_url: "https://archiver.example".to_string(),
        app_version: "0.1.0".to_string(),
    }
}

/// Walk the container tags and return every opened reply id with the nesting level it opened at
fn container_nesting(html: &str) -> Vec<(String, usize)> {
    let mut depth = 0usize;
    let mut opened = Vec::new();
    let mut rest = html;

    loop {
        let open = rest.find("<article ");
        let close = rest.find("</article>");
        match (open, close) {
            (None, None) => break,
            (Some(o), c) if c.is_none_or(|c| o < c) => {
                depth += 1;
                let tag = &rest[o..];
                let start = tag.find("id=\"").unwrap() + 4;
                let end = tag[start..].find('"').unwrap();
                opened.push((tag[start..start + end].to_string(), depth));
                rest = &rest[o + "<article ".len()..];
            }
            (_, Some(c)) => {
                assert!(depth > 0, "closed a container that was never opened");
                depth -= 1;
                rest = &rest[c + "</article>".len()..];
            }
            _ => unreachable!(),
        }
    }

    assert_eq!(depth, 0, "containers left open at end of document");
    opened
}

fn build(replies: Vec<ReplyRecord>) -> Hierarchy {
    Hierarchy::build(root_item(), replies).unwrap()
}

#[test]
fn nests_third_reply_under_second() {
    let tree = build(vec![
        reply("c1", "t3_root"),
        reply("c2", "t3_root"),
        reply("c3", "c2"),
    ]);

    let html = render_document(&tree, &options()).unwrap();

    assert_eq!(html.matches("<article ").count(), 3);
    assert_eq!(html.matches("</article>").count(), 3);
    assert_eq!(
        container_nesting(&html),
        vec![
            ("c1".to_string(), 1),
            ("c2".to_string(), 1),
            ("c3".to_string(), 2),
        ]
    );
}

#[test]
fn unwinds_several_levels_at_once() {
    let tree = build(vec![
        reply("a", "t3_root"),
        reply("a1", "a"),
        reply("a2", "a1"),
        reply("a3", "a2"),
        reply("b", "t3_root"),
        reply("b1", "b"),
    ]);

    let html = render_document(&tree, &options()).unwrap();

    assert_eq!(
        container_nesting(&html),
        vec![
            ("a".to_string(), 1),
            ("a1".to_string(), 2),
            ("a2".to_string(), 3),
            ("a3".to_string(), 4),
            ("b".to_string(), 1),
            ("b1".to_string(), 2),
        ]
    );
}

#[test]
fn preorder_follows_provider_sibling_order() {
    let tree = build(vec![
        reply("x", "t3_root"),
        reply("y", "t3_root"),
        reply("x1", "x"),
        reply("x2", "x"),
        reply("y1", "y"),
    ]);

    let html = render_document(&tree, &options()).unwrap();
    let order: Vec<String> = container_nesting(&html).into_iter().map(|(id, _)| id).collect();

    assert_eq!(order, vec!["x", "x1", "x2", "y", "y1"]);
}

#[test]
fn opens_equal_closes_equal_reply_count() {
    let mut replies = Vec::new();
    for i in 0..20 {
        replies.push(reply(&format!("top{i}"), "t3_root"));
        for j in 0..(i % 4) {
            let parent = if j == 0 {
                format!("top{i}")
            } else {
                format!("r{i}_{}", j - 1)
            };
            replies.push(reply(&format!("r{i}_{j}"), &parent));
        }
    }
    let count = replies.len();
    let tree = build(replies);

    let html = render_document(&tree, &options()).unwrap();

    assert_eq!(html.matches("<article ").count(), count);
    assert_eq!(html.matches("</article>").count(), count);
    assert_eq!(container_nesting(&html).len(), count);
}

#[test]
fn thread_without_replies_has_no_containers() {
    let tree = build(Vec::new());
    let html = render_document(&tree, &options()).unwrap();

    assert_eq!(html.matches("<article").count(), 0);
    assert_eq!(html.matches("</article>").count(), 0);
    assert!(html.contains("<h3>Comments</h3>"));
}

#[test]
fn very_deep_chain_renders_without_recursion() {
    let mut replies = vec![reply("d0", "t3_root")];
    for i in 1..5_000 {
        replies.push(reply(&format!("d{i}"), &format!("d{}", i - 1)));
    }
    let tree = build(replies);

    let html = render_document(&tree, &options()).unwrap();

    assert_eq!(html.matches("</article>").count(), 5_000);
    assert!(html.ends_with("</script></body></html>"));
}

#[test]
fn depth_beyond_limit_fails_deterministically() {
    let tree = build(vec![
        reply("c1", "t3_root"),
        reply("c2", "c1"),
        reply("c3", "c2"),
    ]);
    let opts = RenderOptions {
        max_depth: 2,
        ..options()
    };

    let err = render_document(&tree, &opts).unwrap_err();

    assert_eq!(
        err,
        RenderError::DepthExceeded {
            id: "c3".to_string(),
            depth: 3,
            limit: 2
        }
    );
}

#[test]
fn navigation_links_follow_sibling_positions() {
    let tree = build(vec![
        reply("c1", "t3_root"),
        reply("c2", "t3_root"),
        reply("c3", "c2"),
    ]);
    let id_of = |name: &str| {
        (0..tree.len())
            .find(|&i| tree.node(i).id == name)
            .unwrap()
    };

    assert_eq!(
        navigation(&tree, id_of("c1")),
        NavLinks {
            parent: "t3_root".to_string(),
            previous: None,
            next: Some("c2".to_string()),
        }
    );
    assert_eq!(
        navigation(&tree, id_of("c2")),
        NavLinks {
            parent: "t3_root".to_string(),
            previous: Some("c1".to_string()),
            next: None,
        }
    );
    assert_eq!(
        navigation(&tree, id_of("c3")),
        NavLinks {
            parent: "c2".to_string(),
            previous: None,
            next: None,
        }
    );
}

#[test]
fn disabled_links_carry_marker_and_no_target() {
    let tree = build(vec![reply("c1", "t3_root"), reply("c2", "t3_root")]);
    let html = render_document(&tree, &options()).unwrap();

    assert!(html.contains(r##"<a href="#" class="n A D">"##), "first child previous link");
    assert!(html.contains(r##"<a href="#c2" class="n B">"##));
    assert!(html.contains(r##"<a href="#c1" class="n A">"##));
    assert!(html.contains(r##"<a href="#" class="n B D">"##), "last child next link");
    assert!(html.contains(r##"<a href="#t3_root" class="n P">"##));
    assert!(html.contains(r##"<a href="#c1" class="n S">"##));
}

#[test]
fn class_priority_admin_moderator_submitter_parity() {
    let mut r = reply("c", "t3_root");
    r.is_submitter = true;
    r.distinguished = Distinguished::Admin;
    assert_eq!(classes_for(1, &r), "f a l1");

    r.distinguished = Distinguished::Moderator;
    assert_eq!(classes_for(2, &r), "m l2");

    r.distinguished = Distinguished::None;
    assert_eq!(classes_for(3, &r), "p l3");

    r.is_submitter = false;
    assert_eq!(classes_for(4, &r), "e l4");
    assert_eq!(classes_for(5, &r), "o l5");
}

#[test]
fn band_class_cycles_every_ten_levels() {
    let r = reply("c", "t3_root");
    assert_eq!(classes_for(10, &r), "e l0");
    assert_eq!(classes_for(12, &r), "e l2");
    assert_eq!(classes_for(21, &r), "o l1");
}

#[test]
fn deleted_author_and_body_are_marked() {
    let mut r = reply("gone", "t3_root");
    r.author = None;
    r.body = None;
    let tree = build(vec![r]);

    let html = render_document(&tree, &options()).unwrap();

    assert!(html.contains(">(deleted)</a>, on"));
    assert!(html.contains("<p>(deleted)</p>"));
}

#[test]
fn edited_marker_and_score_in_reply_header() {
    let mut r = reply("c1", "t3_root");
    r.score = 17;
    r.edited = Edited::At(1_700_000_500);
    let tree = build(vec![r, reply("c2", "t3_root")]);

    let html = render_document(&tree, &options()).unwrap();

    assert!(html.contains("(17, edited)"));
    assert!(html.contains("(1)"), "unedited reply shows bare score");
}

#[test]
fn header_shows_root_metadata() {
    let mut root = root_item();
    root.reply_count = 3;
    root.upvote_ratio = 0.75;
    root.flair = Some("Discussion".to_string());
    root.nsfw = true;
    root.locked = true;
    let tree = Hierarchy::build(root, Vec::new()).unwrap();

    let html = render_document(&tree, &options()).unwrap();

    assert!(html.contains("Snapshot taken on 2024-01-02 03:04:05"));
    assert!(html.contains("Posts: 3"));
    assert!(html.contains("(75% upvoted)"));
    assert!(html.contains("Flair: Discussion"));
    assert!(html.contains("Sorted by: confidence"));
    assert!(html.contains("NSFW: Yes"));
    assert!(html.contains("Locked: Yes"));
    assert!(html.contains("Sticky: No"));
    assert!(html.contains("<title>rust &ndash; A thread</title>"));
    assert!(html.contains(r#"<section class="p f l1" id="t3_root">"#));
    assert!(html.contains(r#"href="https://archiver.example">thread-archiver</a> v0.1.0"#));
}

#[test]
fn reply_content_is_escaped() {
    let mut r = reply("c1", "t3_root");
    r.body = Some("<img src=x onerror=alert(1)>".to_string());
    r.author = Some("<b>".to_string());
    let tree = build(vec![r]);

    let html = render_document(&tree, &options()).unwrap();

    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(html.contains("&lt;b&gt;"));
}
