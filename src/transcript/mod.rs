//! Transcript extraction for tubechat.
//!
//! Fetches a video's caption track and flattens it into plain text. An empty
//! string is the universal "no transcript" signal; extraction never fails.

mod youtube;

pub use youtube::YoutubeTranscripts;

use crate::discovery::ContentItem;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A single timed caption segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// The flattened transcript of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub item_id: String,
    /// Full transcript text; empty when no transcript is available.
    pub text: String,
}

impl TranscriptRecord {
    /// Whether this record carries no usable transcript.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Trait for caption track providers.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch all caption segments for a video.
    async fn fetch_segments(&self, item_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Flattens provider segments into transcript text.
pub struct TranscriptExtractor {
    provider: Arc<dyn TranscriptProvider>,
}

impl TranscriptExtractor {
    pub fn new(provider: Arc<dyn TranscriptProvider>) -> Self {
        Self { provider }
    }

    /// Return the full transcript of `item_id`, or an empty string if none is
    /// available.
    #[instrument(skip(self))]
    pub async fn extract(&self, item_id: &str) -> String {
        match self.provider.fetch_segments(item_id).await {
            Ok(segments) => {
                let text = join_segments(segments);
                debug!("Transcript for {} has {} characters", item_id, text.chars().count());
                text
            }
            Err(e) => {
                warn!("No transcript for video {}: {}", item_id, e);
                String::new()
            }
        }
    }

    /// Extract the transcript of a discovered item.
    pub async fn extract_record(&self, item: &ContentItem) -> TranscriptRecord {
        TranscriptRecord {
            item_id: item.id.clone(),
            text: self.extract(&item.id).await,
        }
    }
}

/// Join segments in temporal order with single spaces.
fn join_segments(mut segments: Vec<TranscriptSegment>) -> String {
    segments.sort_by(|a, b| {
        a.start_seconds
            .partial_cmp(&b.start_seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticTranscripts;

    #[tokio::test]
    async fn test_joins_segments_in_temporal_order() {
        let provider = StaticTranscripts::new().with_segments(
            "vid1",
            vec![
                TranscriptSegment::new("are great pets.", 1.5, 1.0),
                TranscriptSegment::new("Cats", 0.0, 1.5),
                TranscriptSegment::new("  ", 2.0, 0.5),
                TranscriptSegment::new("They are independent.", 2.5, 2.0),
            ],
        );
        let extractor = TranscriptExtractor::new(Arc::new(provider));

        assert_eq!(
            extractor.extract("vid1").await,
            "Cats are great pets. They are independent."
        );
    }

    #[tokio::test]
    async fn test_failure_yields_empty_string() {
        let extractor = TranscriptExtractor::new(Arc::new(StaticTranscripts::new()));
        let record = extractor
            .extract_record(&ContentItem::new("missing", "Title", "Channel"))
            .await;

        assert_eq!(record.item_id, "missing");
        assert!(record.is_empty());
    }
}
