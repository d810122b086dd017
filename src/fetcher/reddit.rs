//! Reddit API fetcher.

use super::Fetcher;
use super::listing::{
    Listing, MoreChildrenResponse, Pending, ReplyCollector, Thing, TokenResponse,
    root_from_listing,
};
use crate::config::ProviderConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::{Credential, ReplyRecord, RootItem};
use async_trait::async_trait;
use reqwest::StatusCode;

/// [`Fetcher`] backed by the Reddit OAuth API
///
/// Every call exchanges the stored refresh credential for a short-lived
/// access token first.
pub struct RedditFetcher {
    http_client: reqwest::Client,
    config: ProviderConfig,
}

impl RedditFetcher {
    /// Create a new fetcher
    ///
    /// # Errors
    /// Returns error if an endpoint root is not an absolute URL or the HTTP
    /// client cannot be created
    pub fn new(config: ProviderConfig) -> Result<Self> {
        for (key, root) in [
            ("provider.api_root", &config.api_root),
            ("provider.auth_root", &config.auth_root),
        ] {
            url::Url::parse(root).map_err(|e| Error::Config {
                message: format!("invalid endpoint '{}': {}", root, e),
                key: Some(key.to_string()),
            })?;
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root.trim_end_matches('/'), path)
    }

    async fn access_token(&self, credential: &Credential) -> std::result::Result<String, FetchError> {
        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_root.trim_end_matches('/')
        );

        let response = self
            .http_client
            .post(url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credential.expose()),
            ])
            .send()
            .await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(FetchError::AuthExpired(format!(
                "token exchange answered {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(status_error(status, "token exchange"));
        }

        let token: TokenResponse = response.json().await?;
        match token.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(access_token),
            _ => Err(FetchError::AuthExpired(
                token
                    .error
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    /// GET an API path and map provider status codes onto [`FetchError`]
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
        submission: &str,
    ) -> std::result::Result<reqwest::Response, FetchError> {
        let response = self
            .http_client
            .get(self.api_url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(FetchError::SubmissionNotFound {
                submission: submission.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::AuthExpired(
                format!("{} answered {}", path, status),
            )),
            s => Err(status_error(s, path)),
        }
    }

    /// Read the thread listing; with `focus` set, only that reply's subtree
    async fn thread(
        &self,
        short_id: &str,
        focus: Option<&str>,
        token: &str,
    ) -> std::result::Result<(Listing, Listing), FetchError> {
        let path = match focus {
            Some(reply) => format!("/comments/{}/_/{}", short_id, reply),
            None => format!("/comments/{}", short_id),
        };
        let query = [
            ("raw_json", "1".to_string()),
            ("limit", self.config.comment_limit.to_string()),
            ("sort", self.config.sort.clone()),
        ];

        let (root, replies): (Listing, Listing) = self
            .get(&path, &query, token, short_id)
            .await?
            .json()
            .await?;
        Ok((root, replies))
    }

    async fn more_children(
        &self,
        link_id: &str,
        ids: &[String],
        token: &str,
    ) -> std::result::Result<Vec<Thing>, FetchError> {
        let query = [
            ("api_type", "json".to_string()),
            ("raw_json", "1".to_string()),
            ("link_id", link_id.to_string()),
            ("children", ids.join(",")),
            ("sort", self.config.sort.clone()),
        ];

        let body: MoreChildrenResponse = self
            .get("/api/morechildren", &query, token, link_id)
            .await?
            .json()
            .await?;

        if !body.json.errors.is_empty() {
            return Err(FetchError::provider(format!(
                "morechildren reported errors: {:?}",
                body.json.errors
            )));
        }

        Ok(body.json.data.map(|d| d.things).unwrap_or_default())
    }
}

fn status_error(status: StatusCode, context: &str) -> FetchError {
    let message = format!("{} answered {}", context, status);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::transient(message)
    } else {
        FetchError::provider(message)
    }
}

#[async_trait]
impl Fetcher for RedditFetcher {
    async fn fetch_root(
        &self,
        submission_id: &str,
        credential: &Credential,
    ) -> std::result::Result<RootItem, FetchError> {
        let token = self.access_token(credential).await?;
        let query = [
            ("id", format!("t3_{}", submission_id)),
            ("raw_json", "1".to_string()),
        ];

        let listing: Listing = self
            .get("/api/info", &query, &token, submission_id)
            .await?
            .json()
            .await?;

        let root = root_from_listing(listing, submission_id)?;
        tracing::debug!(
            submission = submission_id,
            reply_count = root.reply_count,
            "fetched submission"
        );
        Ok(root)
    }

    async fn fetch_replies(
        &self,
        root: &RootItem,
        credential: &Credential,
    ) -> std::result::Result<Vec<ReplyRecord>, FetchError> {
        let token = self.access_token(credential).await?;
        let short_id = root.id.strip_prefix("t3_").unwrap_or(&root.id);

        let (_, replies) = self.thread(short_id, None, &token).await?;
        let mut collector = ReplyCollector::new();
        collector.absorb(replies.data.children)?;

        let batch = self.config.more_children_batch.max(1);
        let mut expansions = 0usize;

        while let Some(pending) = collector.next_pending() {
            expansions += 1;
            match pending {
                Pending::More(ids) => {
                    for chunk in ids.chunks(batch) {
                        let things = self.more_children(&root.id, chunk, &token).await?;
                        collector.absorb(things)?;
                    }
                }
                Pending::Continue(parent_id) => {
                    let focus = parent_id.strip_prefix("t1_").unwrap_or(&parent_id);
                    let (_, replies) = self.thread(short_id, Some(focus), &token).await?;
                    collector.absorb(replies.data.children)?;
                }
            }
        }

        tracing::debug!(
            submission = short_id,
            replies = collector.len(),
            expansions,
            "reply set fully expanded"
        );

        Ok(collector.into_ordered(&root.id))
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}
