//! Callpilot - a conversational copilot for sales-call transcripts
//!
//! Indexes `[MM:SS] Speaker: text` transcripts into a vector store and answers questions or
//! writes call summaries over them, always citing the retrieved snippets.
//!
//! # Overview
//!
//! Callpilot allows you to:
//! - Parse transcripts into segments tagged with pricing, security and competitor mentions
//! - Pack segments into size-bounded chunks and index them
//! - Search with metadata filters, falling back to an unfiltered search for a single call
//! - Ask questions and summarize calls through an OpenAI-compatible chat model
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `ingestion` - Segment parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `retrieval` - Filter normalization, hit mapping and search
//! - `llm` - Chat model abstraction
//! - `rag` - Answers and summaries with sources
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use callpilot::config::Settings;
//! use callpilot::orchestrator::Orchestrator;
//! use callpilot::retrieval::FilterSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let dir = settings.transcripts_dir();
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.ingest_dir(&dir).await?;
//!     println!("Indexed {} chunks", report.total_chunks);
//!
//!     let spec = FilterSpec::for_call("2_pricing_call");
//!     if let Some(answer) = orchestrator.ask("What is the list price?", 6, &spec).await? {
//!         println!("{}", answer);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod vector_store;

pub use error::{CallpilotError, Result};
