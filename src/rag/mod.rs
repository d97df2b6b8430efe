// Retrieval-augmented answering
//
// Components:
// - Collaborators: Embedder, VectorStore and LanguageModel seams
// - Relevance: distance-to-relevance conversion and threshold filtering
// - Prompt: grounded and fallback prompt composition
// - Pipeline: end-to-end orchestration with conversational memory

pub mod collaborators;
pub mod relevance;
pub mod prompt;
pub mod pipeline;

// Re-export key types
pub use collaborators::{Embedder, LanguageModel, RetrievalResult, VectorStore};
pub use relevance::{relevance, FilteredContext, RelevanceFilter};
pub use prompt::{PromptBuilder, PromptConfig};
pub use pipeline::{
    AnswerRequest, AnswerResult, Confidence, ConversationSession, PipelineConfig,
    RetrievalAnsweringPipeline,
};
