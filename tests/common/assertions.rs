//! Custom test assertions for integration tests

use std::time::Duration;
use thread_archiver::{Archiver, JobId, StatusLabel, StatusResult};

/// Result of waiting for a job to finish
#[derive(Debug)]
pub enum WaitResult {
    /// Job succeeded
    Completed,
    /// Job failed with the given status message
    Failed(Option<String>),
    /// Timeout waiting for a terminal state
    Timeout(StatusResult),
}

/// Poll a job until it is terminal
///
/// # Arguments
/// * `archiver` - The archiver instance
/// * `job_id` - Job to wait for
/// * `timeout` - Maximum time to wait
pub async fn wait_for_completion(
    archiver: &Archiver,
    job_id: &JobId,
    timeout: Duration,
) -> WaitResult {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let status = archiver
            .status(job_id)
            .await
            .expect("status query should not fail");
        match status.status {
            StatusLabel::Success => return WaitResult::Completed,
            StatusLabel::Failure => return WaitResult::Failed(status.error_message),
            _ if tokio::time::Instant::now() >= deadline => return WaitResult::Timeout(status),
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
}

/// Assert that the nesting of `<article>` containers in `html` matches the
/// expected `(id, depth)` sequence in document order
pub fn assert_article_nesting(html: &str, expected: &[(&str, usize)]) {
    let mut depth = 0usize;
    let mut seen = Vec::new();
    let mut rest = html;

    loop {
        let open = rest.find("<article ");
        let close = rest.find("</article>");
        match (open, close) {
            (Some(o), c) if c.is_none_or(|c| o < c) => {
                depth += 1;
                let tag = &rest[o..];
                let id_start = tag.find("id=\"").expect("article without id") + 4;
                let id_len = tag[id_start..].find('"').expect("unterminated id");
                seen.push((tag[id_start..id_start + id_len].to_string(), depth));
                rest = &rest[o + "<article ".len()..];
            }
            (_, Some(c)) => {
                assert!(depth > 0, "closing tag without an open container");
                depth -= 1;
                rest = &rest[c + "</article>".len()..];
            }
            _ => break,
        }
    }

    assert_eq!(depth, 0, "every container must be closed");
    let expected: Vec<(String, usize)> = expected
        .iter()
        .map(|(id, d)| (id.to_string(), *d))
        .collect();
    assert_eq!(seen, expected);
}
