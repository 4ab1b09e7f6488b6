//! Relevo - conversational requirements elicitation assistant
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use relevo::cli::{Cli, Command};
use relevo::config::Config;
use relevo::engine::Engine;
use relevo::intake::QUESTIONS;
use relevo::llm::create_client;
use relevo::prompts::PromptLoader;
use relevo::repl::ReplSession;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relevo")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    // Logs go to a file so they never interleave with the chat itself
    let log_file = fs::File::create(log_dir.join("relevo.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Preguntas) => cmd_preguntas(),
        Some(Command::Chat { initial }) => cmd_chat(&config, initial).await,
        None => cmd_chat(&config, None).await,
    }
}

/// Run the interactive elicitation session
async fn cmd_chat(config: &Config, initial: Option<String>) -> Result<()> {
    // Fail fast before entering the prompt loop
    config.validate()?;

    let client = create_client(&config.llm)?;
    let prompts = PromptLoader::new(config.prompts_dir.clone());
    let engine = Engine::new(client, prompts, config)?;

    ReplSession::new(engine).run(initial).await
}

/// Print the fixed intake question list
fn cmd_preguntas() -> Result<()> {
    for (n, question) in QUESTIONS.iter().enumerate() {
        println!("{}. [{}] {}", n + 1, question.category, question.prompt);
    }
    Ok(())
}
