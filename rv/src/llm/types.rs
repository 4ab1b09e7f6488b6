//! LLM request/response types
//!
//! These types model the Gemini generateContent API but stay provider-agnostic
//! enough that another backend could implement [`super::LlmClient`].

use serde::{Deserialize, Serialize};

/// A completion request - everything needed for one model call
///
/// The gateway is stateless at this level; conversational memory is carried
/// by replaying the full turn history on every request (see
/// [`super::ChatSession`]).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction sent once per request
    pub system_instruction: String,

    /// Full conversation history, oldest first
    pub turns: Vec<Turn>,

    /// Max tokens for the response
    pub max_tokens: u32,
}

/// One turn of the conversation as the provider sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Create a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Turn role in provider terms ("user" / "model")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content of the first candidate (if any)
    pub text: Option<String>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other,
}

impl FinishReason {
    /// Parse from the API's finishReason string
    pub fn from_api(s: &str) -> Self {
        match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            _ => FinishReason::Other,
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}
