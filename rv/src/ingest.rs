//! Document and audio ingestion
//!
//! PDF decoding is delegated to an external `pdftotext` process; plain-text
//! formats are read directly. Audio is never decoded locally: the extracted
//! "text" is a descriptive placeholder and any real transcription happens
//! inside the model call.

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::IngestConfig;
use crate::session::AttachmentKind;

/// Document extensions handled by the ingestor
const DOCUMENT_EXTENSIONS: [&str; 5] = ["pdf", "txt", "md", "doc", "docx"];

/// Audio container extensions accepted as opaque uploads
const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "ogg"];

/// Errors that can occur during file ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: .{extension}")]
    UnsupportedType { extension: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdftotext failed with status {status}: {stderr}")]
    PdfToText { status: i32, stderr: String },
}

/// Classify an upload by extension
///
/// Anything that is not a known audio container counts as a document, so the
/// unsupported-type condition surfaces during extraction, not here.
pub fn classify(path: &Path) -> AttachmentKind {
    let ext = extension(path);
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        AttachmentKind::Audio
    } else {
        AttachmentKind::Document
    }
}

/// Extract the text representation of an upload
pub async fn extract(path: &Path, kind: AttachmentKind, size_bytes: u64, config: &IngestConfig) -> Result<String, IngestError> {
    match kind {
        AttachmentKind::Audio => Ok(audio_placeholder(path, size_bytes)),
        AttachmentKind::Document => extract_document(path, config).await,
    }
}

async fn extract_document(path: &Path, config: &IngestConfig) -> Result<String, IngestError> {
    let ext = extension(path);
    debug!(path = %path.display(), %ext, "extract_document: called");
    if !DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(IngestError::UnsupportedType { extension: ext });
    }
    match ext.as_str() {
        "pdf" => extract_pdf(path, config).await,
        "txt" | "md" => Ok(tokio::fs::read_to_string(path).await?),
        // Office formats are read naively; binary junk survives as lossy UTF-8
        _ => {
            let bytes = tokio::fs::read(path).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Run pdftotext and join pages with blank-line separators
async fn extract_pdf(path: &Path, config: &IngestConfig) -> Result<String, IngestError> {
    let output = Command::new(&config.pdftotext_path)
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .await?;

    if !output.status.success() {
        return Err(IngestError::PdfToText {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    // pdftotext separates pages with form feeds
    let pages: Vec<&str> = text.split('\u{0c}').map(str::trim).filter(|p| !p.is_empty()).collect();
    Ok(pages.join("\n\n"))
}

/// Synthetic extracted text for an audio upload
pub fn audio_placeholder(path: &Path, size_bytes: u64) -> String {
    let name = file_name(path);
    format!(
        "[Archivo de audio: {} - {} MB. El audio será procesado y transcrito para extraer requisitos relevantes. \
         Por favor, menciona los detalles importantes del audio en tu mensaje.]",
        name,
        size_mb(size_bytes)
    )
}

/// File size in MB with two decimals, as shown to the model and the user
pub fn size_mb(size_bytes: u64) -> String {
    format!("{:.2}", size_bytes as f64 / 1024.0 / 1024.0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
