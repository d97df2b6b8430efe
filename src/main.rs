//! healthrag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use healthrag::{
    cli::{Args, Commands, Config},
    conversation::{new_session_id, SessionManager, SessionStore, DEFAULT_SESSION},
    embedding::EmbeddingEngine,
    llm::OllamaClient,
    logging,
    rag::{AnswerRequest, RetrievalAnsweringPipeline},
    repl::{display, ReplSession},
    store::QdrantStore,
};

/// Wire the collaborators into a shared pipeline
async fn build_pipeline(config: &Config) -> Result<Arc<RetrievalAnsweringPipeline>> {
    let llm = OllamaClient::with_config(
        &config.ollama.base_url,
        &config.ollama.model,
        config.ollama.temperature,
        config.ollama.timeout(),
    )?;
    if !llm.health_check().await {
        tracing::warn!(
            url = llm.base_url(),
            "Ollama is not responding; start it with `ollama serve`"
        );
    }

    let model_id = config.embedding.model_id.clone();
    let embedder = tokio::task::spawn_blocking(move || EmbeddingEngine::new(&model_id))
        .await
        .context("Embedding model loader panicked")??;

    let store =
        QdrantStore::connect(&config.vector_store.url, &config.vector_store.collection).await?;

    Ok(Arc::new(RetrievalAnsweringPipeline::with_config(
        Arc::new(embedder),
        Arc::new(store),
        Arc::new(llm),
        config.pipeline.clone(),
    )))
}

fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(config.state_dir().join("sessions"))
}

/// Options of the one-shot `ask` command
struct AskOptions {
    top_k: Option<usize>,
    session: Option<String>,
    use_memory: bool,
    json: bool,
}

/// Answer one question and exit, saving the session when one was named
async fn run_ask(config: &Config, question: String, options: AskOptions) -> Result<()> {
    let saved = match &options.session {
        Some(id) => Some((session_store(config), id.as_str())),
        None => None,
    };
    let previous = match &saved {
        Some((store, id)) => store.load(id)?,
        None => Vec::new(),
    };

    let pipeline = build_pipeline(config).await?;
    let sessions = SessionManager::new(pipeline);
    let session_id = options.session.as_deref().unwrap_or(DEFAULT_SESSION);
    sessions.restore(session_id, previous).await;

    let spinner = (!options.json).then(display::start_thinking);
    let request = AnswerRequest {
        question,
        top_k: options.top_k,
        use_memory: options.use_memory,
    };
    let result = sessions.answer(session_id, request).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let result = result?;
    if let Some((store, id)) = &saved {
        store.save(id, &sessions.history(id).await)?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        display::show_answer(&result);
    }
    Ok(())
}

/// Run the interactive conversation loop, resuming and saving the session
async fn run_chat(config: &Config, session: Option<String>) -> Result<()> {
    let store = session_store(config);
    let session_id = session.unwrap_or_else(new_session_id);
    let previous = store.load(&session_id)?;

    let pipeline = build_pipeline(config).await?;
    let sessions = Arc::new(SessionManager::new(pipeline));
    sessions.restore(&session_id, previous).await;

    let history_path = config.state_dir().join("history.txt");
    let mut repl = ReplSession::with_history(sessions.clone(), session_id.clone(), history_path)?;
    let outcome = repl.run(env!("CARGO_PKG_VERSION"), &config.ollama.model).await;

    let path = store.save(&session_id, &sessions.history(&session_id).await)?;
    tracing::info!(session_id = %session_id, path = %path.display(), "conversation saved");
    outcome
}

/// Print the effective configuration
fn show_config(config: &Config) -> Result<()> {
    println!("{}", "Effective configuration:".bold().cyan());
    if let Some(path) = Config::default_path() {
        println!("{} {}\n", "Default location:".dimmed(), path.display());
    }
    println!("{}", config.to_toml()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = Config::load(args.config.clone())?;
    logging::init(&config.log_dir(), args.log_level());
    tracing::debug!(?config, "configuration loaded");

    let question = args.command.question();
    match args.command {
        Commands::Ask { top_k, session, no_memory, json, .. } => {
            let options = AskOptions {
                top_k,
                session,
                use_memory: !no_memory,
                json,
            };
            run_ask(&config, question.unwrap_or_default(), options).await?;
        }
        Commands::Chat { session } => {
            run_chat(&config, session).await?;
        }
        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}
