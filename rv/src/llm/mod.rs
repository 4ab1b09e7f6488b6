//! Model gateway
//!
//! Provides the completion client trait, the Gemini implementation and the
//! stateful chat session wrapper.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
mod session;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use session::ChatSession;
pub use types::{CompletionRequest, CompletionResponse, FinishReason, TokenUsage, Turn, TurnRole};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: gemini",
            other
        ))),
    }
}
