//! The content store: idempotent upsert and similarity query over transcripts.
//!
//! Wraps a [`VectorStore`] and an [`Embedder`] so callers work in terms of
//! text. Upserts are first-write-wins: an id that is already stored is
//! reported as [`UpsertOutcome::AlreadyPresent`] without re-embedding.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{ChunkMetadata, IndexedItem, StoredChunk, UpsertOutcome, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of results returned by [`ContentStore::query`].
pub const DEFAULT_TOP_K: usize = 3;

/// One retrieved chunk with its relevance score.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Similarity to the question (higher is more relevant).
    pub relevance: f32,
}

/// Retrieved chunks ordered by decreasing relevance.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    hits: Vec<QueryHit>,
}

impl QueryResult {
    pub fn new(hits: Vec<QueryHit>) -> Self {
        Self { hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn hits(&self) -> &[QueryHit] {
        &self.hits
    }
}

impl IntoIterator for QueryResult {
    type Item = QueryHit;
    type IntoIter = std::vec::IntoIter<QueryHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

/// Similarity-searchable index of transcript chunks.
#[derive(Clone)]
pub struct ContentStore {
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl ContentStore {
    pub fn new(vectors: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vectors,
            embedder,
            min_score: 0.0,
        }
    }

    /// Set the minimum similarity a hit needs to be returned.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Store `document` under `item_id` unless that id is already present.
    #[instrument(skip(self, document, metadata))]
    pub async fn upsert(
        &self,
        item_id: &str,
        document: &str,
        metadata: ChunkMetadata,
    ) -> Result<UpsertOutcome> {
        if self.vectors.contains(item_id).await? {
            debug!("{} already indexed, skipping", item_id);
            return Ok(UpsertOutcome::AlreadyPresent);
        }

        let embedding = self.embedder.embed(document).await?;
        let metadata = ChunkMetadata {
            item_id: item_id.to_string(),
            ..metadata
        };
        let chunk = StoredChunk::new(document.to_string(), metadata, embedding);

        // A concurrent writer may have won since the check above
        self.vectors.insert_if_absent(&chunk).await
    }

    /// Return up to `k` stored chunks most similar to `question`.
    #[instrument(skip(self))]
    pub async fn query(&self, question: &str, k: usize) -> Result<QueryResult> {
        if self.vectors.count().await? == 0 {
            return Ok(QueryResult::default());
        }

        let embedding = self.embedder.embed(question).await?;
        let hits = self
            .vectors
            .search_with_threshold(&embedding, k, self.min_score)
            .await?;

        debug!("Query matched {} chunks", hits.len());
        Ok(QueryResult::new(
            hits.into_iter()
                .map(|hit| QueryHit {
                    document: hit.chunk.document,
                    metadata: hit.chunk.metadata,
                    relevance: hit.score,
                })
                .collect(),
        ))
    }

    pub async fn contains(&self, item_id: &str) -> Result<bool> {
        self.vectors.contains(item_id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.vectors.count().await
    }

    pub async fn list(&self) -> Result<Vec<IndexedItem>> {
        self.vectors.list().await
    }

    /// Drop an item so it can be ingested afresh.
    pub async fn remove(&self, item_id: &str) -> Result<bool> {
        self.vectors.delete(item_id).await
    }
}
