//! In-memory vector store implementation.
//!
//! Useful for testing and one-off sessions that don't need persistence.

use super::{rank, IndexedItem, SearchHit, StoredChunk, UpsertOutcome, VectorStore};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    chunks: RwLock<HashMap<String, StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredChunk>>> {
        self.chunks
            .read()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredChunk>>> {
        self.chunks
            .write()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_if_absent(&self, chunk: &StoredChunk) -> Result<UpsertOutcome> {
        let mut chunks = self.write()?;
        match chunks.entry(chunk.item_id.clone()) {
            Entry::Occupied(_) => Ok(UpsertOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(chunk.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        let chunks = self.read()?;
        Ok(rank(chunks.values().cloned(), query_embedding, limit, min_score))
    }

    async fn contains(&self, item_id: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(item_id))
    }

    async fn get(&self, item_id: &str) -> Result<Option<StoredChunk>> {
        Ok(self.read()?.get(item_id).cloned())
    }

    async fn list(&self) -> Result<Vec<IndexedItem>> {
        let chunks = self.read()?;
        let mut items: Vec<IndexedItem> = chunks.values().map(IndexedItem::from).collect();
        items.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(items)
    }

    async fn delete(&self, item_id: &str) -> Result<bool> {
        Ok(self.write()?.remove(item_id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
