//! Terminal rendering for answers, history and progress

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::conversation::types::{Role, SourceMetadata, Turn};
use crate::rag::pipeline::{AnswerResult, Confidence};

/// Show welcome banner
pub fn show_banner(version: &str, model: &str, session_id: &str) {
    let width = 64;
    let rule = "=".repeat(width);

    println!("\n{}", rule.cyan());
    println!("{}", format!("  healthrag {} - Health Information Assistant", version).bold().cyan());
    println!("{}", format!("  Model: {} | Session: {}", model, session_id).dimmed());
    println!("{}\n", rule.cyan());
    println!(
        "Ask a health question (or {} for commands, {} to quit)\n",
        "/help".green(),
        "/exit".green()
    );
    println!(
        "{}\n",
        "Answers are general information, not medical advice. Consult a healthcare professional."
            .yellow()
    );
}

/// Spinner shown while the pipeline runs
pub fn start_thinking() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message("Searching the health library...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render an answer with its confidence and sources
pub fn show_answer(result: &AnswerResult) {
    println!("\n{}\n", result.answer);

    let confidence = match result.confidence {
        Confidence::High => "high".green(),
        Confidence::Low => "low (not covered by the document library)".yellow(),
    };
    println!("  {} {}", "Confidence:".dimmed(), confidence);

    if !result.sources.is_empty() {
        println!("  {} {}", "Sources:".dimmed(), format_sources(&result.sources));
    }
    println!();
}

/// Render conversation turns
pub fn show_history(turns: &[Turn]) {
    if turns.is_empty() {
        println!("{}", "No conversation yet.".yellow());
        return;
    }

    println!("\n{}", format!("Conversation ({} turns):", turns.len()).bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    for turn in turns {
        let label = match turn.role {
            Role::User => turn.role.label().green().bold(),
            Role::Assistant => turn.role.label().cyan().bold(),
        };
        let time = turn.timestamp.format("%H:%M:%S").to_string();
        println!("  {} {} {}", time.dimmed(), label, turn.content);
        if !turn.sources.is_empty() {
            println!("     {}", format_sources(&turn.sources).dimmed());
        }
    }
    println!();
}

/// Render an error
pub fn show_error(message: &str) {
    println!("{} {}", "Error:".red().bold(), message);
}

/// Unique citations in first-seen order, joined with commas
pub fn format_sources(sources: &[SourceMetadata]) -> String {
    let mut seen: Vec<String> = Vec::new();
    for source in sources {
        let citation = source.citation();
        if !seen.contains(&citation) {
            seen.push(citation);
        }
    }
    seen.join(", ")
}
