//! Error types for healthrag
//!
//! Collaborator failures are wrapped with the pipeline stage that raised
//! them and surfaced to the caller unmodified in kind.

use thiserror::Error;

/// Main error type for the retrieval-answering pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// The embedder could not produce a query vector
    #[error("embedding stage failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    /// The vector store query failed
    #[error("retrieval stage failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    /// The language model failed to generate or paraphrase
    #[error("generation stage failed: {0:#}")]
    Generation(#[source] anyhow::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Name of the pipeline stage that failed, if the error came from one
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            RagError::Embedding(_) => Some("embedding"),
            RagError::Retrieval(_) => Some("retrieval"),
            RagError::Generation(_) => Some("generation"),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;
