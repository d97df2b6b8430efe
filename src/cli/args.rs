//! Command-line argument parsing for healthrag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// healthrag - Ask health questions answered from an indexed document corpus
#[derive(Parser, Debug)]
#[command(name = "healthrag")]
#[command(version)]
#[command(about = "Retrieval-augmented health question answering", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (info), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,

        /// Number of chunks to retrieve (defaults to the configured top_k)
        #[arg(long)]
        top_k: Option<usize>,

        /// Continue a saved session (the conversation is saved again afterwards)
        #[arg(long)]
        session: Option<String>,

        /// Leave the session's previous conversation out of the prompt
        #[arg(long)]
        no_memory: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive conversation
    Chat {
        /// Session identifier (a fresh one is generated when omitted)
        #[arg(long)]
        session: Option<String>,
    },

    /// Display the effective configuration
    Config,
}

impl Args {
    /// Log filter directive for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Commands {
    /// Question text for `ask`, words joined with spaces
    pub fn question(&self) -> Option<String> {
        match self {
            Commands::Ask { question, .. } => Some(question.join(" ")),
            _ => None,
        }
    }
}
