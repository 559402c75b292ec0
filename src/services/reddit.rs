// src/services/reddit.rs

//! Reddit feed client.
//!
//! Authenticates with the application-only OAuth flow and reads the "hot"
//! listing of a subreddit together with its `over18` flag.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{FeedBatch, FeedConfig, FeedItem};
use crate::services::FeedClient;
use crate::utils::http::create_async_client;

/// Refresh the token this long before Reddit says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SubredditAbout {
    #[serde(default)]
    over18: bool,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    children: Vec<Thing<Post>>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

/// Feed client backed by the Reddit API.
pub struct RedditClient {
    config: FeedConfig,
    client: Client,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    /// Create a new Reddit client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        Ok(Self {
            config,
            client,
            token: Mutex::new(None),
        })
    }

    /// Return a cached token, requesting a new one when stale.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        log::debug!("Requesting Reddit access token");
        let response: TokenResponse = self
            .client
            .post(&self.config.auth_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let token = AccessToken {
            value: response.access_token,
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", self.config.api_base.trim_end_matches('/'), path);

        let value = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .query(&[("raw_json", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl FeedClient for RedditClient {
    async fn fetch_top(&self, collection: &str, limit: usize) -> Result<FeedBatch> {
        let about: Thing<SubredditAbout> = self
            .get_json(&format!("r/{collection}/about"), &[])
            .await?;

        let listing: Thing<Listing> = self
            .get_json(
                &format!("r/{collection}/hot"),
                &[("limit", limit.to_string())],
            )
            .await?;

        let items: Vec<FeedItem> = listing
            .data
            .children
            .into_iter()
            .take(limit)
            .map(|child| FeedItem::new(child.data.title, child.data.url))
            .collect();

        log::debug!(
            "Fetched {} posts from r/{} (over18: {})",
            items.len(),
            collection,
            about.data.over18
        );

        Ok(FeedBatch {
            collection: collection.to_string(),
            adult: about.data.over18,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_parses() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_x",
                "children": [
                    {"kind": "t3", "data": {"title": "Plumbus", "url": "https://youtu.be/abc", "score": 10}},
                    {"kind": "t3", "data": {"title": "Self post", "url": "https://www.reddit.com/r/x/comments/1"}}
                ]
            }
        }"#;

        let listing: Thing<Listing> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 2);
        assert_eq!(listing.data.children[0].data.title, "Plumbus");
        assert_eq!(listing.data.children[0].data.url, "https://youtu.be/abc");
    }

    #[test]
    fn test_about_parses_over18() {
        let json = r#"{"kind": "t5", "data": {"display_name": "x", "over18": true}}"#;
        let about: Thing<SubredditAbout> = serde_json::from_str(json).unwrap();
        assert!(about.data.over18);
    }

    #[test]
    fn test_token_freshness() {
        let stale = AccessToken {
            value: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        let fresh = AccessToken {
            value: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(!stale.is_fresh());
        assert!(fresh.is_fresh());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(RedditClient::new(FeedConfig::default()).is_ok());
    }
}
