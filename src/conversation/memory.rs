//! Bounded conversation memory for one session
//!
//! Keeps the most recent `2 * max_history` turns (one exchange is a user
//! turn plus an assistant turn) and evicts the oldest first. Only the
//! last two exchanges are ever rendered back into a prompt.

use std::collections::VecDeque;

use crate::conversation::types::{Role, SourceMetadata, Turn};

/// Default number of exchanges retained per session
pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Number of trailing turns rendered by `get_context`
pub const CONTEXT_TURNS: usize = 4;

/// Memory of one conversation
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    max_history: usize,
}

impl ConversationMemory {
    pub fn new(max_history: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_history * 2 + 1),
            max_history,
        }
    }

    /// Rebuild memory from saved turns, keeping only the newest that fit
    pub fn from_turns(max_history: usize, turns: impl IntoIterator<Item = Turn>) -> Self {
        let mut memory = Self::new(max_history);
        for turn in turns {
            memory.push(turn);
        }
        memory
    }

    /// Append a turn, then evict from the front until the cap holds
    pub fn add(&mut self, role: Role, content: impl Into<String>, sources: Vec<SourceMetadata>) {
        self.push(Turn::new(role, content, sources));
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);

        while self.turns.len() > self.capacity() {
            self.turns.pop_front();
        }
    }

    /// Transcript of the last two exchanges, empty when nothing is stored
    pub fn get_context(&self) -> String {
        if self.turns.is_empty() {
            return String::new();
        }

        let start = self.turns.len().saturating_sub(CONTEXT_TURNS);
        let mut context = String::from("Previous conversation:\n");
        for turn in self.turns.range(start..) {
            context.push_str(turn.role.label());
            context.push_str(": ");
            context.push_str(&turn.content);
            context.push('\n');
        }
        context
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Every retained turn, oldest first
    pub fn history(&self) -> &VecDeque<Turn> {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Maximum number of retained turns
    pub fn capacity(&self) -> usize {
        self.max_history * 2
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
