// Interfaces to the services the pipeline depends on
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::types::SourceMetadata;

/// Instruction used to rewrite a grounded answer in a conversational register
pub const PARAPHRASE_INSTRUCTION: &str = "Rewrite the following answer in a clear, warm and \
conversational way. Keep every fact exactly as stated and do not add any new claims, advice \
or details:";

/// Maps text to embedding vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour lookup over the indexed corpus
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `n_results` items ordered by ascending distance
    async fn query_by_embedding(&self, embedding: &[f32], n_results: usize)
        -> Result<RetrievalResult>;
}

/// Text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Rewrite an answer without changing its content
    async fn paraphrase(&self, text: &str) -> Result<String> {
        let prompt = format!("{}\n{}", PARAPHRASE_INSTRUCTION, text);
        self.generate(&prompt).await
    }
}

/// Result of a single-query vector search, indexed by rank
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<String>,
    pub metadatas: Vec<SourceMetadata>,
    pub distances: Vec<f32>,
}

impl RetrievalResult {
    pub fn push(&mut self, document: impl Into<String>, metadata: SourceMetadata, distance: f32) {
        self.documents.push(document.into());
        self.metadatas.push(metadata);
        self.distances.push(distance);
    }

    /// Number of complete (document, metadata, distance) triples
    pub fn len(&self) -> usize {
        self.documents
            .len()
            .min(self.metadatas.len())
            .min(self.distances.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the three sequences disagree in length
    pub fn is_ragged(&self) -> bool {
        self.documents.len() != self.metadatas.len()
            || self.documents.len() != self.distances.len()
    }

    /// Triples in rank order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SourceMetadata, f32)> + '_ {
        self.documents
            .iter()
            .zip(self.metadatas.iter())
            .zip(self.distances.iter().copied())
            .map(|((doc, meta), distance)| (doc, meta, distance))
    }
}
