//! Requestor sessions and their stored provider credentials.

use crate::error::DatabaseError;
use crate::types::Credential;
use crate::{Error, Result};
use async_trait::async_trait;

use super::{CredentialStore, Database, Session};

impl Database {
    /// Store (or replace) the credential for a session key
    pub async fn store_credential(&self, session_key: &str, credential: &Credential) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, credential, created_at, last_seen_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                credential = excluded.credential,
                last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(session_key)
        .bind(credential.expose())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to store credential: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Fetch the credential for a session key, refreshing its `last_seen_at`
    pub async fn lookup_credential(&self, session_key: &str) -> Result<Option<Credential>> {
        let now = chrono::Utc::now().timestamp();

        let credential: Option<String> = sqlx::query_scalar(
            "UPDATE sessions SET last_seen_at = ? WHERE id = ? RETURNING credential",
        )
        .bind(now)
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to look up credential: {}",
                e
            )))
        })?;

        Ok(credential.map(Credential::new))
    }

    /// Get a session record by key
    pub async fn get_session(&self, session_key: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(
            "SELECT id, credential, created_at, last_seen_at FROM sessions WHERE id = ?",
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get session: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Delete sessions whose `last_seen_at` is older than the given Unix timestamp
    ///
    /// Returns the number of sessions deleted.
    pub async fn delete_sessions_idle_since(&self, before_timestamp: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE last_seen_at < ?")
            .bind(before_timestamp)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete idle sessions: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn lookup(&self, session_key: &str) -> Result<Option<Credential>> {
        self.lookup_credential(session_key).await
    }
}
