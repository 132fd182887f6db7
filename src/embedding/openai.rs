//! Embeddings from an OpenAI-compatible endpoint.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{CallpilotError, Result};
use crate::openai::create_compatible_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequest, CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Maximum inputs sent in one embeddings request.
pub const BATCH_SIZE: usize = 100;

/// Embedder backed by the embeddings API of an OpenAI-compatible service.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Build an embedder from settings. Fails when the key variable is unset or empty.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings.api_key().ok_or_else(|| {
            CallpilotError::Config(format!(
                "Embedding provider 'openai' needs {} to be set",
                settings.api_key_env
            ))
        })?;

        Ok(Self {
            client: create_compatible_client(&settings.base_url, &api_key),
            model: settings.model.clone(),
            dimensions: settings.dimensions as usize,
        })
    }

    /// Only the text-embedding-3 family accepts a requested output size.
    fn sends_dimensions(&self) -> bool {
        self.model.starts_with("text-embedding-3")
    }

    /// One request per `BATCH_SIZE` texts, in input order.
    fn batch_requests(&self, texts: &[String]) -> Result<Vec<CreateEmbeddingRequest>> {
        texts
            .chunks(BATCH_SIZE)
            .map(|batch| {
                let mut args = CreateEmbeddingRequestArgs::default();
                args.model(&self.model)
                    .input(EmbeddingInput::StringArray(batch.to_vec()));
                if self.sends_dimensions() {
                    args.dimensions(self.dimensions as u32);
                }
                args.build().map_err(|e| {
                    CallpilotError::Embedding(format!("Failed to build request: {}", e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| CallpilotError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let requests = self.batch_requests(texts)?;
        debug!("Embedding {} texts in {} requests", texts.len(), requests.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for request in requests {
            let expected = match &request.input {
                EmbeddingInput::StringArray(batch) => batch.len(),
                _ => 1,
            };

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| CallpilotError::OpenAI(format!("Embedding API error: {}", e)))?;

            if response.data.len() != expected {
                return Err(CallpilotError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    expected,
                    response.data.len()
                )));
            }

            let mut data = response.data;
            data.sort_by_key(|e| e.index);
            vectors.extend(data.into_iter().map(|e| e.embedding));
        }

        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
