//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relevo - requirements elicitation assistant
#[derive(Parser)]
#[command(
    name = "rv",
    about = "Asistente conversacional de relevamiento de requisitos",
    version,
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; defaults to the interactive chat
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive elicitation session
    Chat {
        /// First message to send before entering the prompt loop
        initial: Option<String>,
    },

    /// Print the fixed intake questions and exit
    Preguntas,
}
