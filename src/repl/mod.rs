//! Interactive conversation loop
//!
//! Reads questions with rustyline, routes `/` commands to the command
//! handler and everything else to the session's pipeline.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::conversation::sessions::SessionManager;
use crate::rag::pipeline::AnswerRequest;
use crate::repl::commands::{is_command, parse};
use crate::repl::input::InputHandler;

/// REPL session bound to one conversation
pub struct ReplSession {
    input_handler: InputHandler,
    sessions: Arc<SessionManager>,
    session_id: String,
}

impl ReplSession {
    /// Create REPL session with persistent input history
    pub fn with_history(
        sessions: Arc<SessionManager>,
        session_id: String,
        history_path: PathBuf,
    ) -> Result<Self> {
        Ok(Self {
            input_handler: InputHandler::with_history(history_path)?,
            sessions,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run until the user exits
    pub async fn run(&mut self, version: &str, model: &str) -> Result<()> {
        display::show_banner(version, model, &self.session_id);

        while let Some(input) = self.input_handler.read_line()? {
            if !self.handle_input(&input).await {
                break;
            }
        }

        self.input_handler.save_history()?;
        Ok(())
    }

    /// Handle one line of input; returns false to exit
    pub async fn handle_input(&mut self, input: &str) -> bool {
        if input.trim().is_empty() {
            return true;
        }

        if is_command(input) {
            return commands::execute(parse(input), &self.sessions, &self.session_id).await;
        }

        let spinner = display::start_thinking();
        let result = self
            .sessions
            .answer(&self.session_id, AnswerRequest::new(input))
            .await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => display::show_answer(&answer),
            Err(e) => {
                tracing::error!(error = %e, stage = e.stage().unwrap_or("none"), "question failed");
                display::show_error(&e.to_string());
            }
        }
        true
    }
}
