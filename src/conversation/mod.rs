//! Conversation state
//!
//! - Types: turns, roles and citation metadata
//! - Memory: bounded per-session turn log
//! - Sessions: memory keyed by caller-supplied session id
//! - Persistence: saved session transcripts

pub mod memory;
pub mod persistence;
pub mod sessions;
pub mod types;

pub use memory::ConversationMemory;
pub use persistence::SessionStore;
pub use sessions::{new_session_id, SessionManager, DEFAULT_SESSION};
pub use types::{Role, SourceMetadata, Turn};
