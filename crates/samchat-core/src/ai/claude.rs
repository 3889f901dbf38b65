use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error, GenerationOptions, Generator};
use crate::error::GenerationError;

pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

impl ClaudeClient {
    pub fn new(api_key: &str, options: GenerationOptions) -> Self {
        Self::with_base_url(CLAUDE_BASE_URL, api_key, options)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, options: GenerationOptions) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            options,
        }
    }
}

#[async_trait]
impl Generator for ClaudeClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ClaudeRequest {
            model: self.options.model.clone(),
            max_tokens: self.options.max_output_tokens,
            temperature: self.options.temperature,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(api_error("Claude", status, &text));
        }

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let text: String = claude_response.content.into_iter().map(|c| c.text).collect();
        if text.trim().is_empty() {
            return Err(GenerationError::Malformed("Claude returned no text".to_string()));
        }
        Ok(text)
    }
}
