//! Stateful conversational session over a stateless client
//!
//! The provider API is stateless; session memory is implemented by replaying
//! the full turn history with every call, which is exactly what the
//! provider's own chat SDKs do under the hood.

use std::sync::Arc;

use tracing::debug;

use super::{CompletionRequest, LlmClient, LlmError, Turn};

/// A single conversational session with the model gateway
///
/// Every prompt sent through [`ChatSession::send`] becomes part of the
/// session memory for all subsequent prompts. A failed call leaves the
/// history untouched so the caller can retry.
pub struct ChatSession {
    client: Arc<dyn LlmClient>,
    system_instruction: String,
    turns: Vec<Turn>,
    max_tokens: u32,
}

impl ChatSession {
    /// Start an empty session
    pub fn new(client: Arc<dyn LlmClient>, system_instruction: String, max_tokens: u32) -> Self {
        Self {
            client,
            system_instruction,
            turns: Vec::new(),
            max_tokens,
        }
    }

    /// Send one prompt within the session and return the completion text
    ///
    /// On success both the prompt and the completion are appended to the
    /// session history. On failure the prompt is rolled back.
    pub async fn send(&mut self, prompt: impl Into<String>) -> Result<String, LlmError> {
        let prompt = prompt.into();
        debug!(turn_count = self.turns.len(), prompt_len = prompt.len(), "send: called");

        self.turns.push(Turn::user(prompt));

        let request = CompletionRequest {
            system_instruction: self.system_instruction.clone(),
            turns: self.turns.clone(),
            max_tokens: self.max_tokens,
        };

        match self.client.complete(request).await {
            Ok(response) => {
                let text = response.text.unwrap_or_default();
                if text.is_empty() {
                    self.turns.pop();
                    return Err(LlmError::InvalidResponse("empty completion".to_string()));
                }
                self.turns.push(Turn::model(text.clone()));
                Ok(text)
            }
            Err(e) => {
                self.turns.pop();
                Err(e)
            }
        }
    }

    /// Number of turns accumulated in the session so far
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }
}
