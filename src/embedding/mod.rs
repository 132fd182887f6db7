//! Embedding generation for semantic search and retrieval.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::{OpenAIEmbedder, BATCH_SIZE};

use crate::config::EmbeddingSettings;
use crate::error::{CallpilotError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider.to_lowercase().as_str() {
        "hashing" | "local" => Ok(Arc::new(HashingEmbedder::new(settings.dimensions as usize))),
        "openai" => Ok(Arc::new(OpenAIEmbedder::from_settings(settings)?)),
        other => Err(CallpilotError::Config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}
