//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust. One row per content
//! item; `INSERT OR IGNORE` on the primary key gives first-write-wins.

use super::{rank, ChunkMetadata, IndexedItem, SearchHit, StoredChunk, UpsertOutcome, VectorStore};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    item_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    source TEXT NOT NULL,
    topic TEXT,
    document TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_indexed_at ON chunks(indexed_at);
"#;

const SELECT_COLUMNS: &str = "item_id, title, source, topic, document, embedding, indexed_at";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while an ingest is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<StoredChunk> {
        let item_id: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at: String = row.get(6)?;

        Ok(StoredChunk {
            item_id: item_id.clone(),
            document: row.get(4)?,
            metadata: ChunkMetadata {
                title: row.get(1)?,
                source: row.get(2)?,
                item_id,
                topic: row.get(3)?,
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunk), fields(item_id = %chunk.item_id))]
    async fn insert_if_absent(&self, chunk: &StoredChunk) -> Result<UpsertOutcome> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO chunks
            (item_id, title, source, topic, document, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                chunk.item_id,
                chunk.metadata.title,
                chunk.metadata.source,
                chunk.metadata.topic,
                chunk.document,
                Self::embedding_to_bytes(&chunk.embedding),
                chunk.indexed_at.to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            debug!("Chunk {} already stored, leaving it untouched", chunk.item_id);
            Ok(UpsertOutcome::AlreadyPresent)
        } else {
            debug!("Stored chunk {}", chunk.item_id);
            Ok(UpsertOutcome::Inserted)
        }
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM chunks", SELECT_COLUMNS))?;
        let chunks: Vec<StoredChunk> = stmt
            .query_map([], Self::row_to_chunk)?
            .filter_map(|row| row.ok())
            .collect();

        let hits = rank(chunks, query_embedding, limit, min_score);
        debug!("Found {} matching chunks", hits.len());
        Ok(hits)
    }

    async fn contains(&self, item_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE item_id = ?1",
            params![item_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn get(&self, item_id: &str) -> Result<Option<StoredChunk>> {
        let conn = self.lock()?;
        let chunk = conn
            .query_row(
                &format!("SELECT {} FROM chunks WHERE item_id = ?1", SELECT_COLUMNS),
                params![item_id],
                Self::row_to_chunk,
            )
            .optional()?;
        Ok(chunk)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<IndexedItem>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, title, source, topic, LENGTH(document), indexed_at
            FROM chunks
            ORDER BY indexed_at DESC
            "#,
        )?;

        let items = stmt.query_map([], |row| {
            let document_chars: i64 = row.get(4)?;
            let indexed_at: String = row.get(5)?;
            Ok(IndexedItem {
                item_id: row.get(0)?,
                title: row.get(1)?,
                source: row.get(2)?,
                topic: row.get(3)?,
                document_chars: document_chars as usize,
                indexed_at: Self::parse_timestamp(&indexed_at),
            })
        })?;

        Ok(items.filter_map(|i| i.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn delete(&self, item_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM chunks WHERE item_id = ?1", params![item_id])?;
        info!("Deleted {} chunks for {}", deleted, item_id);
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::chunk;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store.insert_if_absent(&chunk("vid1", vec![1.0, 0.0, 0.0])).await.unwrap();

        let items = store.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "vid1");
        assert_eq!(items[0].topic.as_deref(), Some("cats"));

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].chunk.metadata.title, "Title vid1");

        assert!(store.delete("vid1").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_or_ignore_keeps_first_write() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let first = chunk("vid1", vec![1.0, 0.0]);
        let mut second = chunk("vid1", vec![0.0, 1.0]);
        second.document = "replacement".to_string();

        assert_eq!(store.insert_if_absent(&first).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(
            store.insert_if_absent(&second).await.unwrap(),
            UpsertOutcome::AlreadyPresent
        );

        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("vid1").await.unwrap().unwrap();
        assert_eq!(stored.document, first.document);
        assert_eq!(stored.embedding, vec![1.0, 0.0]);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store.insert_if_absent(&chunk("vid1", vec![1.0])).await.unwrap();
        }

        let store = SqliteVectorStore::new(&path).unwrap();
        assert!(store.contains("vid1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
