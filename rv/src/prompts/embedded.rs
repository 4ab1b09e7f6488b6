//! Embedded prompt templates
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System instruction for the elicitation specialist
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Welcome message shown before the first question
pub const WELCOME: &str = include_str!("../../prompts/welcome.pmt");

/// Context prompt asking the model to phrase the next fixed question
pub const NEXT_QUESTION: &str = include_str!("../../prompts/next-question.pmt");

/// Closing prompt after the last fixed question
pub const CLOSING: &str = include_str!("../../prompts/closing.pmt");

/// Executive summary prompt
pub const SUMMARY: &str = include_str!("../../prompts/summary.pmt");

/// Analysis prompt for an uploaded document
pub const DOCUMENT: &str = include_str!("../../prompts/document.pmt");

/// Analysis prompt for an uploaded audio file
pub const AUDIO: &str = include_str!("../../prompts/audio.pmt");

/// Message body when ready attachments are sent without user text
pub const INLINE_FILES: &str = include_str!("../../prompts/inline-files.pmt");

/// Get the embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "welcome" => Some(WELCOME),
        "next-question" => Some(NEXT_QUESTION),
        "closing" => Some(CLOSING),
        "summary" => Some(SUMMARY),
        "document" => Some(DOCUMENT),
        "audio" => Some(AUDIO),
        "inline-files" => Some(INLINE_FILES),
        _ => None,
    }
}
