//! Test configuration helpers for archivers backed by a mock provider

use tempfile::TempDir;
use thread_archiver::{Archiver, Config, Credential};
use wiremock::MockServer;

/// Session key that has a stored credential in every test archiver
pub const SESSION: &str = "integration-session";

/// Create an archiver whose provider endpoints point at `server`
///
/// Database and output directory live in the returned temp dir, which must
/// be kept alive for the duration of the test.
pub async fn create_archiver(server: &MockServer) -> (Archiver, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let mut config = Config::default();
    config.provider.api_root = server.uri();
    config.provider.auth_root = server.uri();
    config.provider.client_id = "client".to_string();
    config.provider.client_secret = "secret".to_string();
    config.persistence.database_path = temp_dir.path().join("archiver.db");
    config.archive.output_dir = temp_dir.path().join("output");

    let archiver = Archiver::new(config)
        .await
        .expect("failed to create archiver");
    archiver
        .db
        .store_credential(SESSION, &Credential::new("refresh-token"))
        .await
        .expect("failed to store credential");

    (archiver, temp_dir)
}
