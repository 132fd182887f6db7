//! SQLite-based vector store implementation.
//!
//! Uses SQLite for persistence with cosine distance computed in Rust. Metadata is
//! stored as a flat JSON object next to the document text and embedding.

use super::{rank, QueryResult, StoredChunk, VectorStore};
use crate::embedding::Embedder;
use crate::error::{CallpilotError, Result};
use crate::ingestion::{Chunk, ChunkMetadata};
use crate::retrieval::WhereFilter;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        seq INTEGER NOT NULL,
        call_id TEXT NOT NULL,
        document TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_call_id ON chunks(call_id);
    CREATE INDEX IF NOT EXISTS idx_chunks_seq ON chunks(seq);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CallpilotError::VectorStore(format!("Failed to acquire lock: {}", e)))
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

    fn load_all(conn: &Connection) -> Result<Vec<StoredChunk>> {
        let mut stmt = conn.prepare(
            "SELECT id, document, metadata_json, embedding FROM chunks ORDER BY seq",
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let document: String = row.get(1)?;
            let metadata_json: String = row.get(2)?;
            let embedding: Vec<u8> = row.get(3)?;
            Ok((id, document, metadata_json, embedding))
        })?;

        let mut chunks = Vec::new();
        for row in rows {
            let (id, document, metadata_json, embedding) = row?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;
            chunks.push(StoredChunk {
                id,
                document,
                metadata,
                embedding: Self::bytes_to_embedding(&embedding),
            });
        }

        Ok(chunks)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(CallpilotError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let indexed_at = Utc::now().to_rfc3339();

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let metadata_json = serde_json::to_string(&chunk.metadata)?;

            // Keep the original position of replaced rows so ranking ties stay stable.
            tx.execute(
                r#"
                INSERT INTO chunks (id, seq, call_id, document, metadata_json, embedding, indexed_at)
                VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM chunks), ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    call_id = excluded.call_id,
                    document = excluded.document,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.metadata.call_id,
                    chunk.text,
                    metadata_json,
                    Self::embedding_to_bytes(&embedding),
                    indexed_at,
                ],
            )?;
        }

        tx.commit()?;
        info!("Upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, filter))]
    async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        filter: Option<&WhereFilter>,
    ) -> Result<QueryResult> {
        let query_embedding = self.embedder.embed(query_text).await?;

        let conn = self.lock()?;
        let chunks = Self::load_all(&conn)?;
        let result = rank(&chunks, &query_embedding, n_results, filter);

        debug!(
            "Query matched {} of {} chunks",
            result.documents.first().map_or(0, Vec::len),
            chunks.len()
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT metadata_json FROM chunks ORDER BY seq")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut metadatas = Vec::new();
        for row in rows {
            metadatas.push(serde_json::from_str(&row?)?);
        }
        Ok(metadatas)
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
    use crate::embedding::HashingEmbedder;
    use crate::ingestion::{chunk_segments, parse_str};
    use crate::retrieval::{normalize, FilterSpec};

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(128))
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory(embedder()).unwrap();

        let segments = parse_str(
            "4_negotiation_call",
            "[00:05] AE: We can discount the overage rate\n[01:10] Prospect: Competitor B offered less",
        );
        let chunks = chunk_segments(&segments, 40);
        assert_eq!(chunks.len(), 2);

        assert_eq!(store.upsert(&chunks).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let filter = normalize(&FilterSpec::for_call("4_negotiation_call").with("mentions_competitor", true));
        let result = store.query("competitor", 5, filter.as_ref()).await.unwrap();
        assert_eq!(result.documents[0].len(), 1);
        assert_eq!(result.metadatas[0][0].start_ts, "01:10");

        let distance = result.distances[0][0].as_f64().unwrap();
        assert!((0.0..=2.0).contains(&distance));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = SqliteVectorStore::in_memory(embedder()).unwrap();
        let chunks = chunk_segments(&parse_str("c", "[00:01] AE: hello"), 1500);

        store.upsert(&chunks).await.unwrap();
        store.upsert(&chunks).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chunks.db");

        {
            let store = SqliteVectorStore::new(&path, embedder()).unwrap();
            let chunks = chunk_segments(&parse_str("1_discovery_call", "[00:01] AE: hi"), 1500);
            store.upsert(&chunks).await.unwrap();
        }

        let store = SqliteVectorStore::new(&path, embedder()).unwrap();
        let metas = store.get_all_metadata().await.unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].call_id, "1_discovery_call");
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let v = vec![0.5f32, -1.25, 3.0];
        let bytes = SqliteVectorStore::embedding_to_bytes(&v);
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes), v);
    }
}
