use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::ai::GenerationOptions;
use crate::error::ConfigError;
use crate::orchestrator::CompletionOrder;
use crate::provider::Provider;

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub speech_enabled: Option<bool>,
    /// Program and arguments for the synthesizer; the text is written to its stdin
    pub speech_command: Option<Vec<String>>,
    /// "arrival" (default) or "submission"
    pub completion_order: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file (if any) and apply environment overrides on top
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.apply_env(|key| std::env::var(key).ok()))
    }

    /// Load from an explicit path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Environment values win over the file
    pub fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let gemini_key = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY"));
        if gemini_key.is_some() {
            self.gemini_api_key = gemini_key;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.claude_api_key = Some(key);
        }
        if let Some(host) = var("OLLAMA_HOST") {
            self.ollama_url = Some(host);
        }
        if let Some(provider) = var("SAMCHAT_PROVIDER") {
            self.provider = Some(provider);
        }
        self
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("samchat").join("config.json"))
    }

    pub fn provider(&self) -> Provider {
        match self.provider.as_deref() {
            None => Provider::Gemini,
            Some(name) => Provider::from_str(name).unwrap_or_else(|| {
                warn!(provider = name, "unknown provider in config, using gemini");
                Provider::Gemini
            }),
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        let provider = self.provider();
        GenerationOptions {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            max_output_tokens: self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }

    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Claude => self.claude_api_key.as_deref(),
            Provider::Ollama => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled.unwrap_or(true)
    }

    pub fn completion_order(&self) -> CompletionOrder {
        match self.completion_order.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("arrival") => CompletionOrder::Arrival,
            Some("submission") => CompletionOrder::Submission,
            Some(other) => {
                warn!(order = other, "unknown completion order, using arrival");
                CompletionOrder::Arrival
            }
        }
    }
}
