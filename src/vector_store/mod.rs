//! Vector store abstraction for Callpilot.
//!
//! Stores embed text themselves, so callers only deal in chunks and query text:
//! upsert by ID, query by text with an optional filter, and read back all metadata.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use crate::ingestion::{Chunk, ChunkMetadata};
use crate::retrieval::WhereFilter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw query output: parallel lists, one outer entry per query text.
///
/// Distances are kept as loose JSON values; consumers decide what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<ChunkMetadata>>,
    pub distances: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    /// A result for one query that matched nothing.
    pub fn empty() -> Self {
        Self {
            documents: vec![Vec::new()],
            metadatas: vec![Vec::new()],
            distances: vec![Vec::new()],
        }
    }

    /// Build a single-query result from ranked `(document, metadata, distance)` rows.
    pub fn from_ranked(rows: Vec<(String, ChunkMetadata, f32)>) -> Self {
        let mut documents = Vec::with_capacity(rows.len());
        let mut metadatas = Vec::with_capacity(rows.len());
        let mut distances = Vec::with_capacity(rows.len());

        for (document, metadata, distance) in rows {
            documents.push(document);
            metadatas.push(metadata);
            distances.push(serde_json::Value::from(f64::from(distance)));
        }

        Self {
            documents: vec![documents],
            metadatas: vec![metadatas],
            distances: vec![distances],
        }
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks by ID. Returns the number of chunks written.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Return up to `n_results` chunks closest to `query_text`, ascending by distance.
    async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        filter: Option<&WhereFilter>,
    ) -> Result<QueryResult>;

    /// Metadata of every stored chunk.
    async fn get_all_metadata(&self) -> Result<Vec<ChunkMetadata>>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}

/// A chunk as held by a store, with its embedding.
#[derive(Debug, Clone)]
pub(crate) struct StoredChunk {
    pub id: String,
    pub document: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// Filter, score and order stored chunks for a query embedding.
///
/// Distance is cosine distance; ties keep storage order.
pub(crate) fn rank<'a>(
    chunks: impl IntoIterator<Item = &'a StoredChunk>,
    query_embedding: &[f32],
    n_results: usize,
    filter: Option<&WhereFilter>,
) -> QueryResult {
    if n_results == 0 {
        return QueryResult::empty();
    }

    let mut scored: Vec<(&StoredChunk, f32)> = chunks
        .into_iter()
        .filter(|c| filter.map_or(true, |f| f.matches(&c.metadata)))
        .map(|c| (c, 1.0 - cosine_similarity(query_embedding, &c.embedding)))
        .collect();

    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(n_results);

    QueryResult::from_ranked(
        scored
            .into_iter()
            .map(|(c, distance)| (c.document.clone(), c.metadata.clone(), distance))
            .collect(),
    )
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
