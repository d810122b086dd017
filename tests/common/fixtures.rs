//! Provider responses for the mock server

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Listing holding the submission `t3_{id}`
pub fn link_listing(id: &str, reply_count: i64) -> Value {
    json!({
        "kind": "Listing",
        "data": {"children": [{
            "kind": "t3",
            "data": {
                "name": format!("t3_{id}"),
                "subreddit": "rust",
                "title": "Integration <thread>",
                "permalink": format!("/r/rust/comments/{id}/integration_thread/"),
                "author": "op",
                "selftext": "First paragraph\n\nSecond paragraph",
                "num_comments": reply_count,
                "score": 42,
                "upvote_ratio": 0.5,
                "link_flair_text": null,
                "stickied": false,
                "spoiler": false,
                "over_18": false,
                "is_original_content": false,
                "locked": true,
                "created_utc": 1700000000.0
            }
        }]}
    })
}

/// A reply thing with optional nested replies
pub fn comment(id: &str, parent: &str, replies: Vec<Value>) -> Value {
    let replies = if replies.is_empty() {
        json!("")
    } else {
        listing(replies)
    };
    json!({
        "kind": "t1",
        "data": {
            "name": format!("t1_{id}"),
            "parent_id": parent,
            "author": format!("user_{id}"),
            "body": format!("reply {id}"),
            "distinguished": null,
            "edited": false,
            "permalink": format!("/r/rust/comments/xyz/integration_thread/{id}/"),
            "is_submitter": false,
            "score": 1,
            "created_utc": 1700000100.0,
            "replies": replies
        }
    })
}

/// A "load more" stub
pub fn more(parent: &str, children: &[&str]) -> Value {
    json!({"kind": "more", "data": {"parent_id": parent, "children": children, "count": children.len()}})
}

/// Wrap things in a listing
pub fn listing(children: Vec<Value>) -> Value {
    json!({"kind": "Listing", "data": {"children": children}})
}

/// Token endpoint that always grants an access token
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "access"})))
        .mount(server)
        .await;
}

/// Submission lookup for `id`
pub async fn mount_submission(server: &MockServer, id: &str, reply_count: i64) {
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .and(query_param("id", format!("t3_{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(link_listing(id, reply_count)))
        .mount(server)
        .await;
}
