// Prompt composition for grounded and fallback answers
use serde::{Deserialize, Serialize};

use crate::conversation::types::SourceMetadata;

/// Instruction wrapped around retrieved context
pub const GROUNDED_SYSTEM_PROMPT: &str = "You are a comprehensive health information assistant. \
Greet the user by name if they introduce themselves.\n\
If the question is not about health or medicine, politely explain that you are a health \
information assistant and cannot help with that topic.\n\
When answering health questions:\n\
1. Start with a clear, complete and summarized definition of the condition or topic.\n\
2. Include key characteristics, causes and mechanisms when relevant.\n\
3. Give practical details about symptoms, treatment options and prevention.\n\
4. Use natural, conversational language and never mention documents or sources.\n\
5. If the available information is incomplete, say so and recommend consulting a healthcare \
professional.\n\
6. Do not make claims the context does not support.\n\
7. Keep the answer short enough to be easily understood.\n\n\
Answer accurately from the context below, written as cohesive paragraphs.";

/// Instruction used when retrieval found nothing relevant
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a comprehensive health information assistant. \
The reference material available to you does not cover this question, so answer from general \
health knowledge and tell the user plainly that the provided reference material did not cover \
it.\n\
1. Start with a clear definition.\n\
2. Include key characteristics, causes or mechanisms.\n\
3. Provide practical information about symptoms, treatment or prevention.\n\
4. Use natural conversational language.\n\
5. If information is incomplete, note it.\n\
Keep it polite, and always recommend consulting a healthcare professional for health concerns.";

/// Prompt builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Prefix each context chunk with a `[source - page N]` marker
    pub include_citations: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_citations: false,
        }
    }
}

/// Builds the prompt sent to the language model
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Context block with documents in retrieval rank order
    pub fn context_block(&self, documents: &[String], metadatas: &[SourceMetadata]) -> String {
        let mut context = String::new();
        for (idx, document) in documents.iter().enumerate() {
            if self.config.include_citations {
                let marker = metadatas
                    .get(idx)
                    .map(SourceMetadata::citation)
                    .unwrap_or_else(|| SourceMetadata::default().citation());
                context.push_str(&marker);
                context.push('\n');
            }
            context.push_str(document);
            context.push_str("\n\n");
        }
        context
    }

    /// Prompt grounded in retrieved documents
    pub fn grounded(
        &self,
        documents: &[String],
        metadatas: &[SourceMetadata],
        question: &str,
        memory_context: &str,
    ) -> String {
        let context = self.context_block(documents, metadatas);
        let prompt = format!(
            "{}\n\nCONTEXT:\n{}\nQUESTION:\n{}\nANSWER:",
            GROUNDED_SYSTEM_PROMPT, context, question
        );
        with_memory(memory_context, prompt)
    }

    /// Prompt for answering without retrieved grounding
    pub fn fallback(&self, question: &str, memory_context: &str) -> String {
        let prompt = format!(
            "{}\n\nUser's question: {}\n\nProvide a helpful, professional response:",
            FALLBACK_SYSTEM_PROMPT, question
        );
        with_memory(memory_context, prompt)
    }
}

fn with_memory(memory_context: &str, prompt: String) -> String {
    if memory_context.is_empty() {
        prompt
    } else {
        format!("{}\n\n{}", memory_context, prompt)
    }
}
