//! healthrag - Retrieval-augmented health question answering
//!
//! Answers natural-language health questions from an indexed document
//! corpus, falling back to disclosed general knowledge when retrieval finds
//! nothing relevant, with bounded per-session conversational memory.
//!
//! # Architecture
//!
//! - **rag**: relevance filtering, prompt building and the answering pipeline
//! - **conversation**: turns, bounded memory and per-session routing
//! - **embedding / store / llm**: Candle embedder, Qdrant store, Ollama client
//! - **cli / repl / logging**: configuration, terminal surface, tracing setup

pub mod errors;

// Re-export commonly used types
pub use errors::{RagError, Result};

pub mod conversation;
pub mod rag;

// Collaborator backends
pub mod embedding;
pub mod llm;
pub mod store;

// Terminal surface and ambient setup
pub mod cli;
pub mod logging;
pub mod repl;

pub use conversation::{ConversationMemory, SessionManager, Turn};
pub use rag::{AnswerRequest, AnswerResult, Confidence, RetrievalAnsweringPipeline};
