//! Per-session conversation memory
//!
//! One pipeline is shared by every conversation; each session id owns its
//! own `ConversationMemory`, locked for the duration of an answer so two
//! requests on the same session never interleave.
//!
//! Sessions live until `remove` is called. The manager never evicts on its
//! own, so long-running callers serving many ids own their eviction.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::conversation::memory::ConversationMemory;
use crate::conversation::types::Turn;
use crate::errors::Result;
use crate::rag::pipeline::{AnswerRequest, AnswerResult, RetrievalAnsweringPipeline};

/// Session used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// Generate a fresh session identifier
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Routes answers to per-session memory
pub struct SessionManager {
    pipeline: Arc<RetrievalAnsweringPipeline>,
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationMemory>>>>,
}

impl SessionManager {
    pub fn new(pipeline: Arc<RetrievalAnsweringPipeline>) -> Self {
        Self {
            pipeline,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<RetrievalAnsweringPipeline> {
        &self.pipeline
    }

    async fn memory_for(&self, session_id: &str) -> Arc<Mutex<ConversationMemory>> {
        if let Some(memory) = self.sessions.read().await.get(session_id) {
            return memory.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "session created");
                Arc::new(Mutex::new(self.pipeline.new_memory()))
            })
            .clone()
    }

    /// Answer a question in the given session, creating it if needed
    pub async fn answer(&self, session_id: &str, request: AnswerRequest) -> Result<AnswerResult> {
        let memory = self.memory_for(session_id).await;
        let mut memory = memory.lock().await;
        self.pipeline.answer(&mut memory, request).await
    }

    /// Replace a session's memory with previously saved turns
    pub async fn restore(&self, session_id: &str, turns: Vec<Turn>) {
        let memory = ConversationMemory::from_turns(self.pipeline.config().max_history, turns);
        tracing::debug!(session_id, turns = memory.len(), "session restored");
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), Arc::new(Mutex::new(memory)));
    }

    /// Full retained history, empty for unknown sessions
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        let memory = match self.sessions.read().await.get(session_id) {
            Some(memory) => memory.clone(),
            None => return Vec::new(),
        };
        let memory = memory.lock().await;
        memory.history().iter().cloned().collect()
    }

    /// Prompt context the next answer in this session would see
    pub async fn context(&self, session_id: &str) -> String {
        let memory = match self.sessions.read().await.get(session_id) {
            Some(memory) => memory.clone(),
            None => return String::new(),
        };
        let memory = memory.lock().await;
        memory.get_context()
    }

    /// Empty a session's memory; the session itself stays registered
    pub async fn clear(&self, session_id: &str) {
        let memory = self.sessions.read().await.get(session_id).cloned();
        if let Some(memory) = memory {
            memory.lock().await.clear();
            tracing::debug!(session_id, "session memory cleared");
        }
    }

    /// Drop a session entirely, returning whether it existed
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
