//! Conversation turn types
//!
//! Defines the records stored in session memory and the typed citation
//! metadata attached to retrieved chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when a turn is rendered into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Location of a retrieved chunk inside the document corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Document identifier, usually the file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 1-based page number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Position of the chunk within its page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
}

impl SourceMetadata {
    pub fn new(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: Some(source.into()),
            page: Some(page),
            chunk_index: None,
        }
    }

    pub fn with_chunk_index(mut self, chunk_index: u32) -> Self {
        self.chunk_index = Some(chunk_index);
        self
    }

    /// Citation marker such as `[who-malaria.pdf - page 4]`
    pub fn citation(&self) -> String {
        let source = self.source.as_deref().unwrap_or("unknown");
        match self.page {
            Some(page) => format!("[{} - page {}]", source, page),
            None => format!("[{} - page ?]", source),
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<SourceMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>, sources: Vec<SourceMetadata>) -> Self {
        Self {
            role,
            content: content.into(),
            sources,
            timestamp: Utc::now(),
        }
    }
}
