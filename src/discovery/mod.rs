//! Content discovery for tubechat.
//!
//! Turns a topic into a bounded list of candidate videos. Search failures are
//! never fatal: the caller gets an empty list and the failure is logged.

mod youtube;

pub use youtube::YoutubeSearch;

use crate::error::Result;
use crate::validation::{validate_input, DEFAULT_MAX_INPUT_LENGTH};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Upper bound on the number of items a single discovery call returns.
pub const MAX_DISCOVERY_RESULTS: usize = 20;

/// One discovered piece of video content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Opaque source identifier (a YouTube video id).
    pub id: String,
    /// Video title.
    pub title: String,
    /// Channel or author name.
    pub source: String,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
        }
    }

    /// Canonical watch URL for this item.
    pub fn url(&self) -> String {
        watch_url(&self.id)
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(item_id: &str) -> String {
    format!("https://youtube.com/watch?v={}", item_id)
}

/// Trait for video search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for videos matching `query`, returning at most `max_results` items.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ContentItem>>;
}

/// Discovers candidate videos for a topic.
pub struct ContentDiscovery {
    provider: Arc<dyn SearchProvider>,
}

impl ContentDiscovery {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Discover up to `max_results` videos for `query`.
    ///
    /// `max_results` is clamped to `1..=20`. Invalid input is returned as an
    /// error; provider failures degrade to an empty list.
    #[instrument(skip(self))]
    pub async fn discover(&self, query: &str, max_results: usize) -> Result<Vec<ContentItem>> {
        let query = validate_input(query, DEFAULT_MAX_INPUT_LENGTH)?;
        let max_results = max_results.clamp(1, MAX_DISCOVERY_RESULTS);

        match self.provider.search(&query, max_results).await {
            Ok(mut items) => {
                items.truncate(max_results);
                info!("Found {} videos for '{}'", items.len(), query);
                Ok(items)
            }
            Err(e) => {
                warn!("Video search for '{}' failed: {}", query, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TubechatError;
    use crate::testing::StaticSearch;

    fn items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem::new(format!("vid{:08}", i), format!("Video {}", i), "Channel"))
            .collect()
    }

    #[tokio::test]
    async fn test_clamps_max_results() {
        let search = Arc::new(StaticSearch::new(items(30)));
        let discovery = ContentDiscovery::new(search.clone());

        let found = discovery.discover("cats", 100).await.unwrap();
        assert_eq!(found.len(), 20);
        assert_eq!(search.requested_limits(), vec![20]);

        let found = discovery.discover("cats", 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(search.requested_limits(), vec![20, 1]);
    }

    #[tokio::test]
    async fn test_preserves_provider_order() {
        let discovery = ContentDiscovery::new(Arc::new(StaticSearch::new(items(3))));
        let found = discovery.discover("cats", 20).await.unwrap();
        let ids: Vec<_> = found.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["vid00000000", "vid00000001", "vid00000002"]);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_list() {
        let discovery = ContentDiscovery::new(Arc::new(StaticSearch::failing()));
        let found = discovery.discover("cats", 5).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected_before_search() {
        let search = Arc::new(StaticSearch::new(items(3)));
        let discovery = ContentDiscovery::new(search.clone());
        let err = discovery.discover("  \n ", 5).await.unwrap_err();
        assert!(matches!(err, TubechatError::InvalidInput(_)));
        assert!(search.requested_limits().is_empty());
    }

    #[test]
    fn test_watch_url() {
        let item = ContentItem::new("dQw4w9WgXcQ", "Title", "Channel");
        assert_eq!(item.url(), "https://youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
