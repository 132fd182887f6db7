//! Error types for Callpilot.

use thiserror::Error;

/// Library-level error type for Callpilot operations.
#[derive(Error, Debug)]
pub enum CallpilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CallpilotError {
    /// Short, stable name of the error kind, used in user-facing fallback messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CallpilotError::Config(_) => "ConfigError",
            CallpilotError::Embedding(_) => "EmbeddingError",
            CallpilotError::VectorStore(_) => "VectorStoreError",
            CallpilotError::Llm(_) => "LlmError",
            CallpilotError::Io(_) => "IoError",
            CallpilotError::Json(_) => "JsonError",
            CallpilotError::TomlParse(_) => "TomlParseError",
            CallpilotError::Database(_) => "DatabaseError",
            CallpilotError::OpenAI(_) => "APIError",
            CallpilotError::NotFound(_) => "NotFound",
            CallpilotError::InvalidInput(_) => "InvalidInput",
        }
    }
}

/// Result type alias for Callpilot operations.
pub type Result<T> = std::result::Result<T, CallpilotError>;
