//! YouTube Data API search provider.

use super::{ContentItem, SearchProvider};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";

/// Searches YouTube through the Data API v3 `search.list` endpoint.
pub struct YoutubeSearch {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl YoutubeSearch {
    /// Create a search provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: SEARCH_ENDPOINT.to_string(),
        })
    }

    /// Override the API endpoint (for proxies and local mocks).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
}

impl SearchResponse {
    fn into_items(self) -> Vec<ContentItem> {
        self.items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(ContentItem {
                    id,
                    title: item.snippet.title,
                    source: item.snippet.channel_title,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SearchProvider for YoutubeSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ContentItem>> {
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubechatError::Discovery(format!(
                "YouTube API returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        let items = parsed.into_items();
        debug!("YouTube returned {} videos", items.len());
        Ok(items)
    }
}
