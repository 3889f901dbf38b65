use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error, GenerationOptions, Generator};
use crate::error::GenerationError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

impl OpenAIClient {
    pub fn new(api_key: &str, options: GenerationOptions) -> Self {
        Self::with_base_url(OPENAI_BASE_URL, api_key, options)
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
impl Generator for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = OpenAIRequest {
            model: self.options.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.options.max_output_tokens,
            temperature: self.options.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(api_error("OpenAI", status, &text));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::Malformed("OpenAI returned no content".to_string()))
    }
}
