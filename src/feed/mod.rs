pub mod types;

use crate::config::FeedConfig;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use types::Post;

const FEED_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no feed bearer token is configured")]
    MissingToken,
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Authenticated client for the upstream feed API.
///
/// Holding a value means the credentials were verified when the client was
/// built; callers model "connected" as `Option<FeedClient>`.
pub struct FeedClient {
    http: reqwest::Client,
    api_base: String,
    bearer_token: String,
}

impl FeedClient {
    /// Builds a client and verifies its credentials against the API.
    pub async fn connect(config: &FeedConfig) -> Result<Self, FeedError> {
        let bearer_token = config
            .bearer_token
            .clone()
            .or_else(|| env::var("FEED_BEARER_TOKEN").ok())
            .ok_or(FeedError::MissingToken)?;

        let http = reqwest::Client::builder().timeout(FEED_TIMEOUT).build()?;

        let client = Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bearer_token,
        };
        client.verify_credentials().await?;
        info!("Feed credentials verified against {}", client.api_base);

        Ok(client)
    }

    async fn verify_credentials(&self) -> Result<(), FeedError> {
        let url = format!("{}/account/verify_credentials.json", self.api_base);
        self.get(&url, &[]).await?;
        Ok(())
    }

    /// Fetches one post by id, in extended mode so full variant lists and the
    /// untruncated text come back.
    pub async fn get_post(&self, id: i64) -> Result<Post, FeedError> {
        debug!("Fetching post {} from the feed", id);
        let url = format!("{}/statuses/show.json", self.api_base);
        let response = self
            .get(
                &url,
                &[("id", id.to_string()), ("tweet_mode", "extended".to_string())],
            )
            .await?;
        Ok(response.json::<Post>().await?)
    }

    /// The most recent posts from the authenticated user's home timeline.
    pub async fn home_timeline(&self, count: u8) -> Result<Vec<Post>, FeedError> {
        let url = format!("{}/statuses/home_timeline.json", self.api_base);
        let response = self
            .get(
                &url,
                &[
                    ("count", count.to_string()),
                    ("tweet_mode", "extended".to_string()),
                ],
            )
            .await?;
        Ok(response.json::<Vec<Post>>().await?)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, FeedError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;

    #[tokio::test]
    async fn test_connect_without_token_fails() {
        let config = FeedConfig {
            api_base: "https://feed.example/1.1".to_string(),
            bearer_token: None,
        };
        // Guard against a token leaking in from the environment.
        if env::var("FEED_BEARER_TOKEN").is_ok() {
            return;
        }

        let result = FeedClient::connect(&config).await;
        assert!(matches!(result, Err(FeedError::MissingToken)));
    }
}
