//! Pipeline orchestrator for Callpilot.
//!
//! Coordinates ingestion from a transcripts directory and the retrieval-backed commands.

use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{CallpilotError, Result};
use crate::ingestion::{call_id_from_path, chunk_segments, parse_file};
use crate::llm::{ChatModel, LanguageModel};
use crate::rag::Copilot;
use crate::retrieval::{FilterSpec, Hit, Searcher};
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the Callpilot pipeline.
pub struct Orchestrator {
    settings: Settings,
    vector_store: Arc<dyn VectorStore>,
    searcher: Searcher,
    copilot: Copilot,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    ///
    /// The language model is optional: without an API key, replies are built from hits only.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = create_embedder(&settings.embedding)?;
        let vector_store = create_vector_store(&settings, embedder)?;

        let model = ChatModel::from_settings(&settings.llm);
        match &model {
            Some(m) => info!("Using language model {}", m.model()),
            None => info!(
                "{} is not set; answers will show retrieved snippets only",
                settings.llm.api_key_env
            ),
        }

        Ok(Self::with_components(settings, vector_store, model, prompts))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        vector_store: Arc<dyn VectorStore>,
        model: Option<Arc<dyn LanguageModel>>,
        prompts: Prompts,
    ) -> Self {
        let searcher = Searcher::new(vector_store.clone());
        let copilot = Copilot::new(model).with_prompts(prompts);

        Self {
            settings,
            vector_store,
            searcher,
            copilot,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Parse, chunk and upsert every `*.txt` transcript in `dir`, in file-name order.
    #[instrument(skip(self))]
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        if !dir.is_dir() {
            return Err(CallpilotError::NotFound(format!(
                "Missing transcripts directory: {}",
                dir.display()
            )));
        }

        let mut report = IngestReport::default();
        for path in transcript_files(dir)? {
            let segments = parse_file(&path)?;
            let chunks = chunk_segments(&segments, self.settings.chunking.max_chars);
            let upserted = self.vector_store.upsert(&chunks).await?;

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            info!("Ingested {}: {} segments -> {} chunks", file_name, segments.len(), upserted);

            report.total_chunks += upserted;
            report.files.push(FileReport {
                file_name,
                segments: segments.len(),
                chunks: upserted,
            });
        }

        Ok(report)
    }

    /// Search indexed chunks.
    pub async fn search(&self, query: &str, k: usize, spec: &FilterSpec) -> Result<Vec<Hit>> {
        self.searcher.search(query, k, spec).await
    }

    /// Distinct call IDs currently indexed.
    pub async fn list_call_ids(&self) -> Result<Vec<String>> {
        self.searcher.list_call_ids().await
    }

    /// Answer a question over the indexed calls. `None` when nothing matched.
    #[instrument(skip(self, spec))]
    pub async fn ask(&self, question: &str, k: usize, spec: &FilterSpec) -> Result<Option<String>> {
        let hits = self.search(question, k, spec).await?;
        if hits.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.copilot.answer(question, &hits).await))
    }

    /// Summarize one call. `None` when no chunks were found for it.
    #[instrument(skip(self))]
    pub async fn summarize(&self, call_id: &str, k: usize) -> Result<Option<String>> {
        let query = format!("summary of {}", call_id);
        let hits = self.search(&query, k, &FilterSpec::for_call(call_id)).await?;
        if hits.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.copilot.summarize(call_id, &hits).await))
    }
}

/// Build the vector store selected in settings.
pub fn create_vector_store(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path(), embedder)?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new(embedder))),
        other => Err(CallpilotError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// `*.txt` files directly inside `dir`, sorted by path. A missing directory yields none.
pub fn transcript_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Call ID of the most recently modified transcript in `dir`.
pub fn latest_call_id(dir: &Path) -> Result<Option<String>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for path in transcript_files(dir)? {
        let modified = std::fs::metadata(&path)?.modified()?;
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| call_id_from_path(&path)))
}

/// Outcome of ingesting one transcript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub segments: usize,
    pub chunks: usize,
}

/// Outcome of ingesting a transcripts directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
    pub total_chunks: usize,
}
