//! Integration tests for the answering pipeline
//!
//! Runs the full embed -> retrieve -> filter -> generate -> record flow
//! against in-process collaborators, so no Ollama or Qdrant is needed.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use healthrag::{
    conversation::{Role, SessionManager, SourceMetadata},
    rag::{
        AnswerRequest, Confidence, Embedder, LanguageModel, PipelineConfig,
        RetrievalAnsweringPipeline, RetrievalResult, VectorStore,
    },
    ConversationMemory, RagError,
};

struct StaticEmbedder {
    fail: bool,
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.fail {
            anyhow::bail!("tokenizer unavailable");
        }
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }
}

/// Store returning a fixed result and recording requested sizes
struct FixedStore {
    result: Option<RetrievalResult>,
    requested: Mutex<Vec<usize>>,
}

impl FixedStore {
    fn new(result: RetrievalResult) -> Self {
        Self {
            result: Some(result),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        Self {
            result: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorStore for FixedStore {
    async fn query_by_embedding(
        &self,
        _embedding: &[f32],
        n_results: usize,
    ) -> anyhow::Result<RetrievalResult> {
        self.requested.lock().unwrap().push(n_results);
        match &self.result {
            Some(result) => {
                let mut truncated = RetrievalResult::default();
                for (doc, meta, distance) in result.iter().take(n_results) {
                    truncated.push(doc.clone(), meta.clone(), distance);
                }
                Ok(truncated)
            }
            None => anyhow::bail!("connection refused"),
        }
    }
}

/// Language model replaying scripted replies and recording prompts
struct ScriptedModel {
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: Vec<anyhow::Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply {}", self.prompts.lock().unwrap().len())))
    }
}

fn asthma_result() -> RetrievalResult {
    let mut result = RetrievalResult::default();
    result.push(
        "Asthma is a chronic inflammatory disease of the airways.",
        SourceMetadata::new("asthma_guide.pdf", 3),
        0.2,
    );
    result.push(
        "Inhaled corticosteroids reduce airway inflammation.",
        SourceMetadata::new("asthma_guide.pdf", 7),
        0.4,
    );
    result.push(
        "The liver filters blood from the digestive tract.",
        SourceMetadata::new("anatomy.pdf", 12),
        0.9,
    );
    result
}

fn far_result() -> RetrievalResult {
    let mut result = RetrievalResult::default();
    result.push("Unrelated text.", SourceMetadata::new("misc.pdf", 1), 0.8);
    result.push("More unrelated text.", SourceMetadata::new("misc.pdf", 2), 0.95);
    result
}

fn pipeline(
    embedder: StaticEmbedder,
    store: Arc<FixedStore>,
    llm: Arc<ScriptedModel>,
    config: PipelineConfig,
) -> RetrievalAnsweringPipeline {
    RetrievalAnsweringPipeline::with_config(Arc::new(embedder), store, llm, config)
}

fn no_paraphrase() -> PipelineConfig {
    PipelineConfig {
        enable_paraphrasing: false,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_grounded_answer_keeps_only_relevant_chunks() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(vec![Ok("Asthma inflames the airways.".into())]));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm.clone(), no_paraphrase());
    let mut memory = pipeline.new_memory();

    let result = pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap();

    assert_eq!(result.answer, "Asthma inflames the airways.");
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(
        result.sources,
        vec![
            SourceMetadata::new("asthma_guide.pdf", 3),
            SourceMetadata::new("asthma_guide.pdf", 7),
        ]
    );
    assert_eq!(result.memory_length, 2);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("CONTEXT:\n"));
    assert!(prompts[0].contains("chronic inflammatory disease"));
    assert!(prompts[0].contains("corticosteroids"));
    assert!(!prompts[0].contains("liver"));
    assert!(prompts[0].ends_with("QUESTION:\nWhat is asthma?\nANSWER:"));
    assert!(!prompts[0].contains("Previous conversation:"));
}

#[tokio::test]
async fn test_paraphrase_rewrites_grounded_answer() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(vec![
        Ok("Asthma is chronic airway inflammation.".into()),
        Ok("Asthma means your airways stay inflamed.".into()),
    ]));
    let pipeline = pipeline(
        StaticEmbedder { fail: false },
        store,
        llm.clone(),
        PipelineConfig::default(),
    );
    let mut memory = pipeline.new_memory();

    let result = pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap();

    assert_eq!(result.answer, "Asthma means your airways stay inflamed.");
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].ends_with("Asthma is chronic airway inflammation."));

    // Memory holds the delivered answer, not the draft
    let last = memory.history().back().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "Asthma means your airways stay inflamed.");
}

#[tokio::test]
async fn test_fallback_when_nothing_is_relevant() {
    let store = Arc::new(FixedStore::new(far_result()));
    let llm = Arc::new(ScriptedModel::new(vec![Ok("General information.".into())]));
    let pipeline = pipeline(
        StaticEmbedder { fail: false },
        store,
        llm.clone(),
        PipelineConfig::default(),
    );
    let mut memory = pipeline.new_memory();

    let result = pipeline
        .answer(&mut memory, AnswerRequest::new("How do I fix my bicycle?"))
        .await
        .unwrap();

    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.sources.is_empty());
    assert_eq!(result.answer, "General information.");

    // Fallback answers are never paraphrased
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("did not cover"));
    assert!(prompts[0].contains("User's question: How do I fix my bicycle?"));
    assert!(!prompts[0].contains("Unrelated text."));
}

#[tokio::test]
async fn test_empty_retrieval_falls_back() {
    let store = Arc::new(FixedStore::new(RetrievalResult::default()));
    let llm = Arc::new(ScriptedModel::new(vec![Ok("Nothing indexed.".into())]));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm, no_paraphrase());
    let mut memory = pipeline.new_memory();

    let result = pipeline
        .answer(&mut memory, AnswerRequest::new("Anything?"))
        .await
        .unwrap();

    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.sources.is_empty());
    assert_eq!(result.memory_length, 2);
}

#[tokio::test]
async fn test_follow_up_sees_previous_exchange() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(vec![
        Ok("Asthma inflames the airways.".into()),
        Ok("Inhalers are the usual treatment.".into()),
    ]));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm.clone(), no_paraphrase());
    let mut memory = pipeline.new_memory();

    pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap();
    let second = pipeline
        .answer(&mut memory, AnswerRequest::new("How is it treated?"))
        .await
        .unwrap();

    assert_eq!(second.memory_length, 4);
    let prompts = llm.prompts();
    assert!(prompts[1].starts_with(
        "Previous conversation:\nUser: What is asthma?\nAssistant: Asthma inflames the airways.\n\n\n"
    ));
    assert!(prompts[1].ends_with("QUESTION:\nHow is it treated?\nANSWER:"));
}

#[tokio::test]
async fn test_without_memory_context_still_records_turns() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(Vec::new()));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm.clone(), no_paraphrase());
    let mut memory = pipeline.new_memory();

    pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap();
    let result = pipeline
        .answer(
            &mut memory,
            AnswerRequest::new("How is it treated?").with_memory(false),
        )
        .await
        .unwrap();

    assert!(!llm.prompts()[1].contains("Previous conversation:"));
    assert_eq!(result.memory_length, 4);
}

#[tokio::test]
async fn test_top_k_override_and_default() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(Vec::new()));
    let pipeline = pipeline(
        StaticEmbedder { fail: false },
        store.clone(),
        llm,
        no_paraphrase(),
    );
    let mut memory = pipeline.new_memory();

    let result = pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?").with_top_k(1))
        .await
        .unwrap();
    assert_eq!(result.sources, vec![SourceMetadata::new("asthma_guide.pdf", 3)]);

    pipeline
        .answer(&mut memory, AnswerRequest::new("Again?"))
        .await
        .unwrap();
    pipeline
        .answer(&mut memory, AnswerRequest::new("Zero?").with_top_k(0))
        .await
        .unwrap();

    assert_eq!(*store.requested.lock().unwrap(), vec![1, 6, 6]);
}

#[tokio::test]
async fn test_generation_failure_leaves_memory_untouched() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(vec![
        Ok("First answer.".into()),
        Err(anyhow::anyhow!("model not loaded")),
    ]));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm, no_paraphrase());
    let mut memory = pipeline.new_memory();

    pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap();
    let err = pipeline
        .answer(&mut memory, AnswerRequest::new("And then?"))
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Generation(_)));
    assert_eq!(err.stage(), Some("generation"));
    assert!(err.to_string().contains("model not loaded"));
    assert_eq!(memory.len(), 2);
}

#[tokio::test]
async fn test_fallback_generation_failure_leaves_memory_untouched() {
    let store = Arc::new(FixedStore::new(far_result()));
    let llm = Arc::new(ScriptedModel::new(vec![
        Ok("General guidance.".into()),
        Err(anyhow::anyhow!("connection reset")),
    ]));
    let pipeline = pipeline(
        StaticEmbedder { fail: false },
        store,
        llm.clone(),
        PipelineConfig::default(),
    );
    let mut memory = pipeline.new_memory();

    pipeline
        .answer(&mut memory, AnswerRequest::new("How do I sleep better?"))
        .await
        .unwrap();
    let before: Vec<String> = memory.history().iter().map(|t| t.content.clone()).collect();

    let err = pipeline
        .answer(&mut memory, AnswerRequest::new("And during travel?"))
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Generation(_)));
    assert_eq!(memory.len(), 2);
    let after: Vec<String> = memory.history().iter().map(|t| t.content.clone()).collect();
    assert_eq!(after, before);
    assert!(llm.prompts()[1].contains("User's question: And during travel?"));
}

#[tokio::test]
async fn test_paraphrase_failure_is_a_generation_error() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(vec![
        Ok("Draft.".into()),
        Err(anyhow::anyhow!("timeout")),
    ]));
    let pipeline = pipeline(
        StaticEmbedder { fail: false },
        store,
        llm,
        PipelineConfig::default(),
    );
    let mut memory = pipeline.new_memory();

    let err = pipeline
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some("generation"));
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_embedding_and_retrieval_failures_name_their_stage() {
    let llm = Arc::new(ScriptedModel::new(Vec::new()));

    let broken_embedder = pipeline(
        StaticEmbedder { fail: true },
        Arc::new(FixedStore::new(asthma_result())),
        llm.clone(),
        no_paraphrase(),
    );
    let mut memory = broken_embedder.new_memory();
    let err = broken_embedder
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
    assert!(memory.is_empty());

    let broken_store = pipeline(
        StaticEmbedder { fail: false },
        Arc::new(FixedStore::unreachable()),
        llm.clone(),
        no_paraphrase(),
    );
    let err = broken_store
        .answer(&mut memory, AnswerRequest::new("What is asthma?"))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Retrieval(_)));
    assert!(err.to_string().contains("connection refused"));
    assert!(memory.is_empty());

    // Neither failure reached the model
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_memory_stays_bounded_over_long_conversation() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(Vec::new()));
    let config = PipelineConfig {
        max_history: 2,
        ..no_paraphrase()
    };
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm, config);
    let mut memory = pipeline.new_memory();

    let mut last_length = 0;
    for i in 0..6 {
        let result = pipeline
            .answer(&mut memory, AnswerRequest::new(format!("question {}", i)))
            .await
            .unwrap();
        last_length = result.memory_length;
    }

    assert_eq!(last_length, 4);
    let first = memory.history().front().unwrap();
    assert_eq!(first.role, Role::User);
    assert_eq!(first.content, "question 4");
}

#[tokio::test]
async fn test_sessions_keep_separate_memory() {
    let store = Arc::new(FixedStore::new(asthma_result()));
    let llm = Arc::new(ScriptedModel::new(Vec::new()));
    let pipeline = Arc::new(pipeline(
        StaticEmbedder { fail: false },
        store,
        llm.clone(),
        no_paraphrase(),
    ));
    let sessions = Arc::new(SessionManager::new(pipeline));

    let mut handles = Vec::new();
    for session in ["alice", "bob", "carol"] {
        let sessions = sessions.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..3 {
                sessions
                    .answer(session, AnswerRequest::new(format!("{} asks {}", session, i)))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for session in ["alice", "bob", "carol"] {
        let history = sessions.history(session).await;
        assert_eq!(history.len(), 6);
        assert!(history
            .iter()
            .filter(|turn| turn.role == Role::User)
            .all(|turn| turn.content.starts_with(session)));
    }

    // No prompt ever carries another session's questions
    for prompt in llm.prompts() {
        let owners: Vec<&str> = ["alice", "bob", "carol"]
            .into_iter()
            .filter(|name| prompt.contains(&format!("{} asks", name)))
            .collect();
        assert!(owners.len() <= 1, "prompt mixes sessions: {:?}", owners);
    }
}

#[test]
fn test_memory_usable_outside_async_runtime() {
    let store = Arc::new(FixedStore::new(far_result()));
    let llm = Arc::new(ScriptedModel::new(vec![Ok("Answer.".into())]));
    let pipeline = pipeline(StaticEmbedder { fail: false }, store, llm, no_paraphrase());
    let mut memory = ConversationMemory::new(1);

    let result = tokio_test::block_on(pipeline.answer(&mut memory, AnswerRequest::new("Hi?")))
        .unwrap();

    assert_eq!(result.memory_length, 2);
    assert_eq!(memory.get_context(), "Previous conversation:\nUser: Hi?\nAssistant: Answer.\n");
}
