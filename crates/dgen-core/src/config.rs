//! Configuration models.
//!
//! Loading lives in the infrastructure crate; these are plain serde types so
//! that every field can fall back to a default when the file omits it.

use crate::pacing::PacingPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationSettings,
    pub pacing: PacingPolicy,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Sampling parameters sent with every chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub top_p: f32,
    /// Cancels a session that has not completed after this many seconds.
    pub stream_timeout_secs: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
            top_p: 0.95,
            stream_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
    /// Also write daily-rolling log files into the logs directory.
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: false,
        }
    }
}

/// Contents of `secret.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<OpenAIConfig>,
}

/// OpenAI API credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("organization_id", &self.organization_id)
            .field("model_name", &self.model_name)
            .finish()
    }
}
