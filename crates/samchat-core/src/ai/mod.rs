pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::GenerationError;

/// Tuning passed to every provider call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// A text-generation backend. One attempt per call, no retries.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Stand-in for a provider whose API key is missing
pub struct Unconfigured {
    provider: &'static str,
}

impl Unconfigured {
    pub fn new(provider: &'static str) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Generator for Unconfigured {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(self.provider))
    }
}

/// Build the error for a non-success response, preferring the provider's own
/// message over the raw body
pub(crate) fn api_error(provider: &'static str, status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    GenerationError::Api {
        provider,
        status: status.as_u16(),
        message,
    }
}
