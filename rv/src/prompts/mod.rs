//! Prompt templates
//!
//! Loads prompt templates from an optional override directory or falls back
//! to the embedded defaults, and renders them with Handlebars.

mod embedded;

pub use embedded::get_embedded;

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

/// Context for the next-question prompt
#[derive(Debug, Clone, Serialize)]
pub struct QuestionContext {
    /// Accumulated Q/A pairs so far
    pub context: String,
    /// Wording of the question just answered
    pub current_question: String,
    /// The raw answer just given
    pub answer: String,
    /// Wording of the question to ask next
    pub next_question: String,
}

/// Context for the closing prompt after the last fixed question
#[derive(Debug, Clone, Serialize)]
pub struct ClosingContext {
    pub context: String,
    pub answer: String,
}

/// Context for the document analysis prompt
#[derive(Debug, Clone, Serialize)]
pub struct DocumentContext {
    pub name: String,
    /// Extracted text, already capped by the caller
    pub content: String,
    pub truncated: bool,
}

/// Context for the audio analysis prompt
#[derive(Debug, Clone, Serialize)]
pub struct AudioContext {
    pub name: String,
    pub size_mb: String,
}

/// One file inlined into a text-free submission
#[derive(Debug, Clone, Serialize)]
pub struct InlineFile {
    pub name: String,
    pub content: String,
}

#[derive(Serialize)]
struct WelcomeContext<'a> {
    first_question: &'a str,
}

#[derive(Serialize)]
struct InlineFilesContext {
    files: Vec<InlineFile>,
}

/// Renders prompt templates with an optional on-disk override directory
pub struct PromptLoader {
    handlebars: Handlebars<'static>,
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader; templates in `override_dir` shadow the embedded ones
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        Self {
            handlebars,
            override_dir,
        }
    }

    /// Resolve a template body: override file first, embedded fallback
    fn template(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(%name, path = %path.display(), "template: using override");
                return Ok(std::fs::read_to_string(&path)?);
            }
        }
        get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Unknown prompt template: {}", name))
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let source = self.template(name)?;
        let rendered = self
            .handlebars
            .render_template(&source, context)
            .map_err(|e| eyre!("Failed to render prompt '{}': {}", name, e))?;
        Ok(rendered.trim_end().to_string())
    }

    /// System instruction sent with every request
    pub fn system(&self) -> Result<String> {
        Ok(self.template("system")?.trim_end().to_string())
    }

    /// Welcome message containing the first fixed question
    pub fn welcome(&self, first_question: &str) -> Result<String> {
        self.render("welcome", &WelcomeContext { first_question })
    }

    /// Context prompt instructing the model to ask the next fixed question
    pub fn next_question(&self, context: &QuestionContext) -> Result<String> {
        self.render("next-question", context)
    }

    /// Closing prompt after the final answer
    pub fn closing(&self, context: &ClosingContext) -> Result<String> {
        self.render("closing", context)
    }

    /// Executive summary prompt
    pub fn executive_summary(&self) -> Result<String> {
        Ok(self.template("summary")?.trim_end().to_string())
    }

    /// Analysis prompt for a processed document
    pub fn document(&self, context: &DocumentContext) -> Result<String> {
        self.render("document", context)
    }

    /// Analysis prompt for an uploaded audio file
    pub fn audio(&self, context: &AudioContext) -> Result<String> {
        self.render("audio", context)
    }

    /// Message body inlining ready attachments when the user typed nothing
    pub fn inline_files(&self, files: Vec<InlineFile>) -> Result<String> {
        self.render("inline-files", &InlineFilesContext { files })
    }
}
