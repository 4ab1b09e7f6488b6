//! Session export
//!
//! Serializes the conversation log and tagged requirements to downloadable
//! artifacts: a JSON snapshot and a Markdown report. Both refuse to run on a
//! session with fewer than two messages.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::session::{Role, SessionState};

/// Minimum messages required before an export makes sense
const MIN_MESSAGES: usize = 2;

/// Errors that can occur while exporting a session
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export requires at least {MIN_MESSAGES} messages in the session")]
    TooFewMessages,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Export format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Write the session to `dir` in the requested format
///
/// Returns the path of the written artifact.
pub fn export(state: &SessionState, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
    let now = Local::now();
    let content = match format {
        ExportFormat::Json => render_json(state, now)?,
        ExportFormat::Markdown => render_markdown(state, now)?,
    };

    let path = dir.join(default_filename(format, now));
    fs::write(&path, content)?;
    info!(path = %path.display(), "export: wrote artifact");
    Ok(path)
}

/// Dated artifact name, e.g. `requisitos-2026-08-27.json`
pub fn default_filename(format: ExportFormat, now: DateTime<Local>) -> String {
    format!("requisitos-{}.{}", now.format("%Y-%m-%d"), format.extension())
}

fn guard(state: &SessionState) -> Result<(), ExportError> {
    if state.message_count() < MIN_MESSAGES {
        return Err(ExportError::TooFewMessages);
    }
    Ok(())
}

/// JSON snapshot with the original artifact's field names
fn render_json(state: &SessionState, now: DateTime<Local>) -> Result<String, ExportError> {
    guard(state)?;
    let data = serde_json::json!({
        "fecha": now.to_rfc3339(),
        "mensajes": state.messages(),
        "requisitos": state.requirements(),
        "estadoCompletitud": state.status(),
        "porcentajeCompletitud": state.percentage(),
    });
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Markdown report: requirements by category, then the full transcript
fn render_markdown(state: &SessionState, now: DateTime<Local>) -> Result<String, ExportError> {
    guard(state)?;

    let mut markdown = String::new();
    markdown.push_str("# Relevamiento de Requisitos\n\n");
    markdown.push_str(&format!("**Fecha:** {}\n\n", now.format("%d/%m/%Y")));
    markdown.push_str(&format!("**Completitud:** {}%\n\n", state.percentage()));
    markdown.push_str("## Requisitos Identificados\n\n");

    for entry in state.requirements() {
        markdown.push_str(&format!("### {}\n\n", entry.category));
        for item in &entry.items {
            markdown.push_str(&format!("- {}\n", item));
        }
        markdown.push('\n');
    }

    markdown.push_str("## Conversación Completa\n\n");
    for message in state.messages() {
        let header = match message.role {
            Role::User => "Usuario",
            Role::Assistant => "Asistente",
        };
        markdown.push_str(&format!("### {}\n\n{}\n\n---\n\n", header, message.content));
    }

    Ok(markdown)
}
