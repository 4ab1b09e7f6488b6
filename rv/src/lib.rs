//! Relevo - conversational requirements elicitation assistant
//!
//! Relevo drives a Spanish-language intake interview over an LLM: a fixed
//! sequence of elicitation questions, free-form follow-up, document and audio
//! uploads, keyword-based requirement tagging and session export.
//!
//! # Core Concepts
//!
//! - **Scripted intake first**: nine fixed questions asked strictly in order,
//!   verbatim, before the conversation opens up
//! - **Stateless gateway, stateful session**: the full turn history is
//!   replayed with every model call
//! - **Derived views**: completion status and requirement entries are pure
//!   functions of the conversation log, recomputed after every append
//!
//! # Modules
//!
//! - [`engine`] - Session orchestration
//! - [`intake`] - The fixed question sequencer
//! - [`tagger`] - Keyword scanner producing completion status and requirements
//! - [`llm`] - Completion client trait and the Gemini implementation
//! - [`ingest`] - Document text extraction and audio placeholders
//! - [`export`] - JSON and Markdown session artifacts
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod engine;
pub mod export;
pub mod ingest;
pub mod intake;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod session;
pub mod tagger;

// Re-export commonly used types
pub use config::{Config, ExportConfig, IngestConfig, LlmConfig};
pub use engine::{Engine, ERROR_REPLY, UploadOutcome};
pub use export::{ExportError, ExportFormat};
pub use ingest::IngestError;
pub use intake::{Answer, Intake, IntakePhase, QUESTIONS, Question};
pub use llm::{ChatSession, CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError, create_client};
pub use prompts::PromptLoader;
pub use repl::ReplSession;
pub use session::{Attachment, AttachmentKind, AttachmentRef, AttachmentStatus, ChatMessage, Role, SessionState};
pub use tagger::{Analysis, CompletionStatus, RequirementEntry, analyze};
