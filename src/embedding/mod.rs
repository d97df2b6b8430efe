//! Question embeddings
//!
//! Candle-based BERT sentence embedder implementing `Embedder`.

pub mod engine;

pub use engine::{EmbeddingEngine, DEFAULT_MODEL_ID};
