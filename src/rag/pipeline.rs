// End-to-end retrieval-answering pipeline
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::conversation::memory::{ConversationMemory, DEFAULT_MAX_HISTORY};
use crate::conversation::types::{Role, SourceMetadata, Turn};
use crate::errors::{RagError, Result};
use crate::rag::collaborators::{Embedder, LanguageModel, VectorStore};
use crate::rag::prompt::{PromptBuilder, PromptConfig};
use crate::rag::relevance::{RelevanceFilter, DEFAULT_CONFIDENCE_THRESHOLD};

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 6;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunks retrieved when the request does not say
    pub top_k: usize,
    /// Minimum relevance for a chunk to ground the answer
    pub confidence_threshold: f32,
    /// Rewrite grounded answers in a conversational register
    pub enable_paraphrasing: bool,
    /// Prefix context chunks with citation markers
    pub include_citations: bool,
    /// Exchanges retained per session
    pub max_history: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enable_paraphrasing: true,
            include_citations: false,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Whether the answer was grounded in retrieved documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Low => "low",
        }
    }
}

/// A question to answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    /// Overrides the configured top_k; zero means the default
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Include recent conversation in the prompt
    #[serde(default = "default_use_memory")]
    pub use_memory: bool,
}

fn default_use_memory() -> bool {
    true
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
            use_memory: true,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_memory(mut self, use_memory: bool) -> Self {
        self.use_memory = use_memory;
        self
    }
}

/// Pipeline answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    /// Metadata of the chunks that grounded the answer, empty on fallback
    pub sources: Vec<SourceMetadata>,
    pub confidence: Confidence,
    /// Turns retained in the session after this answer
    pub memory_length: usize,
}

/// Embed -> retrieve -> filter -> prompt -> generate -> record
pub struct RetrievalAnsweringPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    filter: RelevanceFilter,
    prompt_builder: PromptBuilder,
    config: PipelineConfig,
}

impl RetrievalAnsweringPipeline {
    /// Create pipeline with default configuration
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self::with_config(embedder, store, llm, PipelineConfig::default())
    }

    /// Create pipeline with custom configuration
    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            filter: RelevanceFilter::new(config.confidence_threshold),
            prompt_builder: PromptBuilder::with_config(PromptConfig {
                include_citations: config.include_citations,
            }),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fresh memory sized for this pipeline
    pub fn new_memory(&self) -> ConversationMemory {
        ConversationMemory::new(self.config.max_history)
    }

    /// Answer a question within one session.
    ///
    /// Memory is written only after generation succeeds, and both turns
    /// are pushed without an await in between.
    pub async fn answer(
        &self,
        memory: &mut ConversationMemory,
        request: AnswerRequest,
    ) -> Result<AnswerResult> {
        let top_k = match request.top_k {
            Some(k) if k > 0 => k,
            _ => self.config.top_k,
        };
        let question = request.question;

        // Step 1: Embed the question
        let query_embedding = self
            .embedder
            .embed(std::slice::from_ref(&question))
            .await
            .map_err(RagError::Embedding)?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding(anyhow::anyhow!("embedder returned no vectors")))?;
        tracing::debug!(dims = query_embedding.len(), "question embedded");

        // Step 2: Retrieve nearest chunks
        let retrieved = self
            .store
            .query_by_embedding(&query_embedding, top_k)
            .await
            .map_err(RagError::Retrieval)?;
        tracing::debug!(top_k, retrieved = retrieved.len(), "chunks retrieved");

        // Step 3: Keep chunks above the relevance threshold
        let relevant = self.filter.filter(&retrieved);
        tracing::debug!(
            kept = relevant.len(),
            threshold = self.filter.threshold(),
            "relevance filter applied"
        );

        let memory_context = if request.use_memory {
            memory.get_context()
        } else {
            String::new()
        };

        // Step 4: Grounded answer or fallback
        let (answer, confidence) = if relevant.is_empty() {
            let prompt = self.prompt_builder.fallback(&question, &memory_context);
            let answer = self.llm.generate(&prompt).await.map_err(RagError::Generation)?;
            (answer, Confidence::Low)
        } else {
            let prompt = self.prompt_builder.grounded(
                &relevant.documents,
                &relevant.metadatas,
                &question,
                &memory_context,
            );
            let mut answer = self.llm.generate(&prompt).await.map_err(RagError::Generation)?;
            if self.config.enable_paraphrasing {
                answer = self
                    .llm
                    .paraphrase(&answer)
                    .await
                    .map_err(RagError::Generation)?;
            }
            (answer, Confidence::High)
        };

        // Step 5: Record the exchange
        let sources = relevant.metadatas;
        memory.add(Role::User, question, Vec::new());
        memory.add(Role::Assistant, answer.clone(), sources.clone());

        tracing::info!(
            confidence = confidence.as_str(),
            sources = sources.len(),
            memory_length = memory.len(),
            "question answered"
        );

        Ok(AnswerResult {
            answer,
            sources,
            confidence,
            memory_length: memory.len(),
        })
    }
}

/// A single conversation bound to a shared pipeline
pub struct ConversationSession {
    pipeline: Arc<RetrievalAnsweringPipeline>,
    memory: ConversationMemory,
}

impl ConversationSession {
    pub fn new(pipeline: Arc<RetrievalAnsweringPipeline>) -> Self {
        let memory = pipeline.new_memory();
        Self { pipeline, memory }
    }

    pub async fn answer(
        &mut self,
        question: &str,
        top_k: Option<usize>,
        use_memory: bool,
    ) -> Result<AnswerResult> {
        let request = AnswerRequest {
            question: question.to_string(),
            top_k,
            use_memory,
        };
        self.pipeline.answer(&mut self.memory, request).await
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Every retained turn, regardless of what prompts get to see
    pub fn get_conversation_history(&self) -> &VecDeque<Turn> {
        self.memory.history()
    }
}
