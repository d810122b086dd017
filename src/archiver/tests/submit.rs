use crate::archiver::test_helpers::*;
use crate::error::Error;
use crate::types::{JobStatus, StatusLabel};

#[tokio::test]
async fn submit_creates_job_and_returns_immediately() {
    let (archiver, _temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;

    let job_id = archiver
        .submit("https://www.reddit.com/r/rust/comments/abc123/a_thread/", SESSION)
        .await
        .unwrap();

    assert_eq!(job_id.as_str().len(), 22);
    let job = archiver.db.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.submission_ref, "abc123");
    assert_eq!(job.requestor_id, SESSION);

    wait_for_terminal(&archiver, &job_id).await;
}

#[tokio::test]
async fn bad_reference_is_rejected_without_creating_a_job() {
    let fetcher = MockFetcher::small_thread();
    let (archiver, _temp_dir) = create_test_archiver(fetcher).await;

    let err = archiver
        .submit("https://example.com/not/a/thread", SESSION)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BadUrl(_)), "got {err:?}");
    for status in [
        JobStatus::Created,
        JobStatus::Ongoing,
        JobStatus::Success,
        JobStatus::Failure,
    ] {
        assert!(archiver.db.list_jobs_by_status(status).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn missing_credential_is_rejected_without_creating_a_job() {
    let (archiver, _temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;

    let err = archiver.submit("abc123", "stranger").await.unwrap_err();

    assert!(matches!(err, Error::MissingCredential(ref who) if who == "stranger"));
    assert!(
        archiver
            .db
            .list_jobs_by_status(JobStatus::Created)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn job_ids_are_unique() {
    let (archiver, _temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;

    let first = archiver.submit("abc123", SESSION).await.unwrap();
    let second = archiver.submit("abc123", SESSION).await.unwrap();

    assert_ne!(first, second);
    wait_for_terminal(&archiver, &first).await;
    wait_for_terminal(&archiver, &second).await;
    assert_eq!(label(&archiver, &first).await, StatusLabel::Success);
    assert_eq!(label(&archiver, &second).await, StatusLabel::Success);
}

#[tokio::test]
async fn submit_after_shutdown_is_refused() {
    let (archiver, _temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;

    archiver.shutdown().await.unwrap();
    let err = archiver.submit("abc123", SESSION).await.unwrap_err();

    assert!(matches!(err, Error::ShuttingDown));
}
