//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank, QueryResult, StoredChunk, VectorStore};
use crate::embedding::Embedder;
use crate::error::{CallpilotError, Result};
use crate::ingestion::{Chunk, ChunkMetadata};
use crate::retrieval::WhereFilter;
use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Chunks keep their first insertion position.
pub struct MemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .read()
            .map_err(|e| CallpilotError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .write()
            .map_err(|e| CallpilotError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
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

        let mut store = self.write()?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let stored = StoredChunk {
                id: chunk.id.to_string(),
                document: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            };

            match store.iter_mut().find(|c| c.id == stored.id) {
                Some(existing) => *existing = stored,
                None => store.push(stored),
            }
        }

        Ok(chunks.len())
    }

    async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        filter: Option<&WhereFilter>,
    ) -> Result<QueryResult> {
        let query_embedding = self.embedder.embed(query_text).await?;
        let store = self.read()?;
        Ok(rank(store.iter(), &query_embedding, n_results, filter))
    }

    async fn get_all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
        Ok(self.read()?.iter().map(|c| c.metadata.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
