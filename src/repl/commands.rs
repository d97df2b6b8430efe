//! Command handler for REPL built-in commands

use colored::*;

use crate::conversation::sessions::SessionManager;
use crate::repl::display;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { limit: Option<usize> },
    Context,
    Reset,
    Session,
    Exit,
    Unknown { input: String },
}

/// Check if input is a built-in command
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Parse input string into a command
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('/') else {
        return Command::Unknown { input: input.to_string() };
    };

    let parts: Vec<&str> = body.split_whitespace().collect();
    let Some(name) = parts.first() else {
        return Command::Unknown { input: input.to_string() };
    };

    match name.to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        "history" => {
            let limit = parts.get(1).and_then(|s| s.parse().ok());
            Command::History { limit }
        }
        "context" | "ctx" => Command::Context,
        "reset" | "clear" => Command::Reset,
        "session" => Command::Session,
        _ => Command::Unknown { input: input.to_string() },
    }
}

/// Execute a command against one session.
///
/// Returns true if the REPL should continue, false if it should exit.
pub async fn execute(command: Command, sessions: &SessionManager, session_id: &str) -> bool {
    match command {
        Command::Help => {
            show_help();
            true
        }
        Command::Exit => {
            println!("{}", "Goodbye! Stay healthy.".green());
            false
        }
        Command::History { limit } => {
            let history = sessions.history(session_id).await;
            let limit = limit.unwrap_or(history.len());
            let skip = history.len().saturating_sub(limit);
            display::show_history(&history[skip..]);
            true
        }
        Command::Context => {
            let context = sessions.context(session_id).await;
            if context.is_empty() {
                println!("{}", "No conversation context yet.".yellow());
            } else {
                println!("\n{}", "Context sent with the next question:".bold().cyan());
                println!("{}", "=".repeat(60).cyan());
                println!("{}", context);
            }
            true
        }
        Command::Reset => {
            sessions.clear(session_id).await;
            println!("{}", "Conversation memory cleared.".yellow());
            true
        }
        Command::Session => {
            println!("Session: {}", session_id.cyan());
            true
        }
        Command::Unknown { input } => {
            println!("{}", format!("Unknown command: {}", input).red());
            println!("Type {} for available commands", "/help".cyan());
            true
        }
    }
}

/// Display help information
fn show_help() {
    println!("\n{}", "Available Commands:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let commands = [
        ("/help, /h", "Show this help message"),
        ("/history [n]", "Show the last n turns (default: all retained)"),
        ("/context, /ctx", "Show the conversation context sent to the model"),
        ("/reset, /clear", "Clear conversation memory"),
        ("/session", "Show the current session id"),
        ("/exit, /quit, /q", "Exit"),
    ];

    for (cmd, desc) in commands {
        println!("  {:<20} {}", cmd.green(), desc);
    }

    println!("\n{}", "Usage:".bold());
    println!("  - Type a health question directly (no / prefix)");
    println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
    println!();
}
