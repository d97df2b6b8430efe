// Session memory persisted as JSON so conversations survive across runs
use std::fs;
use std::path::PathBuf;

use crate::conversation::types::Turn;
use crate::errors::{RagError, Result};

/// Directory of saved session transcripts, one file per session id
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Saved turns for a session, empty when it was never saved
    pub fn load(&self, session_id: &str) -> Result<Vec<Turn>> {
        let path = self.path_for(session_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)?;
        let turns: Vec<Turn> = serde_json::from_str(&json)?;
        tracing::debug!(session_id, turns = turns.len(), "session loaded");
        Ok(turns)
    }

    /// Write a session's turns, replacing any earlier save
    pub fn save(&self, session_id: &str, turns: &[Turn]) -> Result<PathBuf> {
        let path = self.path_for(session_id)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(turns)?;
        fs::write(&path, json)?;
        tracing::debug!(session_id, path = %path.display(), "session saved");
        Ok(path)
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RagError::Config(format!(
                "invalid session id '{}': use letters, digits, '-' or '_'",
                session_id
            )));
        }
        Ok(self.dir.join(format!("session_{}.json", session_id)))
    }
}
