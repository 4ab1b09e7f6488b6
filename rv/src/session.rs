//! Session state: the conversation log, uploaded files and derived views
//!
//! The log is append-only and owned exclusively by the session. Completion
//! status and requirement entries are pure functions of the log; they are
//! recomputed wholesale after every log mutation once at least two messages
//! exist.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::intake::Intake;
use crate::tagger::{self, CompletionStatus, RequirementEntry};

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl ChatMessage {
    /// Create a user message with text content
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Create a user message carrying attachment references
    pub fn user_with_attachments(content: impl Into<String>, attachments: Vec<AttachmentRef>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
        }
    }
}

/// Kind of uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Document,
    Audio,
}

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Processing,
    Ready,
    Error,
}

/// Lightweight attachment reference embedded in log messages
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentRef {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    pub status: AttachmentStatus,
}

/// An uploaded file and its extracted-text representation
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Extracted text, set once processing succeeds
    pub content: Option<String>,
    pub status: AttachmentStatus,
}

impl Attachment {
    /// Register a new upload in the processing state
    pub fn new(path: &Path, kind: AttachmentKind, size_bytes: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: Uuid::now_v7().to_string(),
            name,
            kind,
            path: path.to_path_buf(),
            size_bytes,
            content: None,
            status: AttachmentStatus::Processing,
        }
    }

    pub fn to_ref(&self) -> AttachmentRef {
        AttachmentRef {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            status: self.status,
        }
    }
}

/// Full mutable state of one chat session
#[derive(Debug, Default)]
pub struct SessionState {
    messages: Vec<ChatMessage>,
    attachments: Vec<Attachment>,
    pub intake: Intake,
    status: CompletionStatus,
    requirements: Vec<RequirementEntry>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append to the log and refresh the derived views
    pub fn push_message(&mut self, message: ChatMessage) {
        debug!(role = ?message.role, content_len = message.content.len(), "push_message");
        self.messages.push(message);
        self.refresh_requirements();
    }

    /// Recompute the tagger views from the whole log
    ///
    /// Skipped while the log holds fewer than two messages.
    fn refresh_requirements(&mut self) {
        if self.messages.len() < 2 {
            return;
        }
        let analysis = tagger::analyze(&self.messages);
        self.status = analysis.status;
        self.requirements = analysis.requirements;
    }

    pub fn status(&self) -> &CompletionStatus {
        &self.status
    }

    pub fn requirements(&self) -> &[RequirementEntry] {
        &self.requirements
    }

    /// Completion percentage across the fixed categories
    pub fn percentage(&self) -> u8 {
        self.status.percentage()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn attachment_mut(&mut self, id: &str) -> Option<&mut Attachment> {
        self.attachments.iter_mut().find(|a| a.id == id)
    }

    /// Attachments whose text is ready to be forwarded
    pub fn ready_attachments(&self) -> Vec<&Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.status == AttachmentStatus::Ready && a.content.is_some())
            .collect()
    }

    /// Drop an uploaded file from the session list
    pub fn remove_attachment(&mut self, id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != id);
        self.attachments.len() != before
    }
}
