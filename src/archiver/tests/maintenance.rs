use crate::archiver::test_helpers::*;
use crate::types::Credential;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn fresh_artifacts_are_kept() {
    let (archiver, temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;
    let output = temp_dir.path().join("output");
    std::fs::write(output.join("rust-thread-20240101-000000.html"), b"<html>").unwrap();

    assert_eq!(archiver.cleanup_artifacts().await.unwrap(), 0);
    assert!(output.join("rust-thread-20240101-000000.html").exists());
}

#[tokio::test]
async fn expired_artifacts_are_removed() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.maintenance.artifact_max_age = Duration::ZERO;
    let archiver = create_archiver_with(config, Arc::new(MockFetcher::small_thread())).await;

    let output = temp_dir.path().join("output");
    std::fs::write(output.join("a.html"), b"<html>").unwrap();
    std::fs::write(output.join("b.html"), b"<html>").unwrap();
    std::fs::write(output.join("notes.txt"), b"keep me").unwrap();
    std::fs::create_dir(output.join("nested.html")).unwrap();

    assert_eq!(archiver.cleanup_artifacts().await.unwrap(), 2);
    assert!(!output.join("a.html").exists());
    assert!(!output.join("b.html").exists());
    assert!(output.join("notes.txt").exists());
    assert!(output.join("nested.html").exists());
}

#[tokio::test]
async fn idle_sessions_are_dropped() {
    let (archiver, _temp_dir) = create_test_archiver(MockFetcher::small_thread()).await;
    archiver
        .db
        .store_credential("stale", &Credential::new("old-token"))
        .await
        .unwrap();
    sqlx::query("UPDATE sessions SET last_seen_at = 0 WHERE id = ?")
        .bind("stale")
        .execute(archiver.db.pool())
        .await
        .unwrap();

    assert_eq!(archiver.cleanup_sessions().await.unwrap(), 1);
    assert!(archiver.db.get_session("stale").await.unwrap().is_none());
    assert!(archiver.db.get_session(SESSION).await.unwrap().is_some());
}
