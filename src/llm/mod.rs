//! Language model backend
//!
//! Ollama HTTP client implementing `LanguageModel`.

pub mod client;

pub use client::OllamaClient;
