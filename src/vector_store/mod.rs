//! Vector store abstraction for tubechat.
//!
//! Stores at most one chunk per content item, keyed by the item id. Writes are
//! insert-if-absent: the first stored chunk for an id wins and later writes for
//! the same id are no-ops.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance stored alongside each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Video title.
    pub title: String,
    /// Channel or author.
    pub source: String,
    /// Video id.
    pub item_id: String,
    /// Topic the item was ingested under.
    pub topic: Option<String>,
}

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Primary key; the content item id.
    pub item_id: String,
    /// Chunk text.
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Embedding of `document`.
    pub embedding: Vec<f32>,
    /// When this chunk was stored.
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    pub fn new(document: String, metadata: ChunkMetadata, embedding: Vec<f32>) -> Self {
        Self {
            item_id: metadata.item_id.clone(),
            document,
            metadata,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search hit with its similarity score (higher is better).
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Summary of an indexed item, without its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedItem {
    pub item_id: String,
    pub title: String,
    pub source: String,
    pub topic: Option<String>,
    /// Length of the stored document in characters.
    pub document_chars: usize,
    pub indexed_at: DateTime<Utc>,
}

impl From<&StoredChunk> for IndexedItem {
    fn from(chunk: &StoredChunk) -> Self {
        Self {
            item_id: chunk.item_id.clone(),
            title: chunk.metadata.title.clone(),
            source: chunk.metadata.source.clone(),
            topic: chunk.metadata.topic.clone(),
            document_chars: chunk.document.chars().count(),
            indexed_at: chunk.indexed_at,
        }
    }
}

/// Result of an insert-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The chunk was stored.
    Inserted,
    /// A chunk with this id already existed and was left untouched.
    AlreadyPresent,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a chunk unless one with the same item id already exists.
    ///
    /// Must be atomic: concurrent writers for the same id see exactly one
    /// `Inserted`, and a failed write leaves existing state unchanged.
    async fn insert_if_absent(&self, chunk: &StoredChunk) -> Result<UpsertOutcome>;

    /// Search for the most similar chunks.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>>;

    /// Check whether an item is stored.
    async fn contains(&self, item_id: &str) -> Result<bool>;

    /// Fetch a stored chunk by item id.
    async fn get(&self, item_id: &str) -> Result<Option<StoredChunk>>;

    /// List stored items, most recently indexed first.
    async fn list(&self) -> Result<Vec<IndexedItem>>;

    /// Remove an item. Returns whether anything was deleted.
    async fn delete(&self, item_id: &str) -> Result<bool>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score, filter and order chunks against a query embedding.
pub(crate) fn rank<I>(chunks: I, query_embedding: &[f32], limit: usize, min_score: f32) -> Vec<SearchHit>
where
    I: IntoIterator<Item = StoredChunk>,
{
    let mut hits: Vec<SearchHit> = chunks
        .into_iter()
        .map(|chunk| {
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            SearchHit { chunk, score }
        })
        .filter(|hit| hit.score >= min_score)
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.item_id.cmp(&b.chunk.item_id))
    });
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn chunk(item_id: &str, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk::new(
            format!("Transcript of {}", item_id),
            ChunkMetadata {
                title: format!("Title {}", item_id),
                source: "Channel".to_string(),
                item_id: item_id.to_string(),
                topic: Some("cats".to_string()),
            },
            embedding,
        )
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_filters_and_limits() {
        let chunks = vec![
            chunk("low", vec![0.2, 1.0]),
            chunk("high", vec![1.0, 0.0]),
            chunk("opposite", vec![-1.0, 0.0]),
            chunk("mid", vec![1.0, 1.0]),
        ];

        let hits = rank(chunks, &[1.0, 0.0], 2, 0.0);
        let ids: Vec<_> = hits.iter().map(|h| h.chunk.item_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }

    #[test]
    fn test_stored_chunk_is_keyed_by_metadata_item_id() {
        let c = chunk("vid1", vec![1.0]);
        assert_eq!(c.item_id, "vid1");
        assert_eq!(IndexedItem::from(&c).document_chars, "Transcript of vid1".len());
    }
}
