//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// File ingestion configuration
    pub ingest: IngestConfig,

    /// Export configuration
    pub export: ExportConfig,

    /// Optional directory with prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with a clear error message.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then project-local `.relevo.yml`, then
    /// `~/.config/relevo/relevo.yml`, then built-in defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".relevo.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relevo").join("relevo.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "gemini" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-flash-latest".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

/// File ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Path to the pdftotext binary (poppler-utils)
    #[serde(rename = "pdftotext-path")]
    pub pdftotext_path: String,

    /// Max characters of document text included in an analysis prompt
    #[serde(rename = "max-document-chars")]
    pub max_document_chars: usize,

    /// Max characters per file when inlining attachments into a message
    #[serde(rename = "max-inline-chars")]
    pub max_inline_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pdftotext_path: "pdftotext".to_string(),
            max_document_chars: 15_000,
            max_inline_chars: 5_000,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory where export artifacts are written
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.ingest.max_document_chars, 15_000);
        assert_eq!(config.ingest.max_inline_chars, 5_000);
        assert_eq!(config.export.directory, PathBuf::from("."));
        assert!(config.prompts_dir.is_none());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
llm:
  model: gemini-1.5-pro
  max-tokens: 2048
ingest:
  pdftotext-path: /usr/local/bin/pdftotext
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.max_tokens, 2048);
        // Unspecified fields keep their defaults
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.ingest.pdftotext_path, "/usr/local/bin/pdftotext");
        assert_eq!(config.ingest.max_inline_chars, 5_000);
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "RELEVO_TEST_MISSING_KEY".to_string();
        unsafe { std::env::remove_var("RELEVO_TEST_MISSING_KEY") };
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("RELEVO_TEST_MISSING_KEY", "k") };
        assert!(config.validate().is_ok());
        unsafe { std::env::remove_var("RELEVO_TEST_MISSING_KEY") };
    }
}
