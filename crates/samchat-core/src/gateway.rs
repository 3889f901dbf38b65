//! Boundary over the external generation provider and the speech device.

use std::sync::Arc;

use tracing::info;

use crate::ai::{ClaudeClient, GeminiClient, Generator, OllamaClient, OpenAIClient, Unconfigured};
use crate::config::Config;
use crate::error::GenerationError;
use crate::provider::Provider;
use crate::speech::{SilentSpeech, SpeechEngine, SpeechQueue, SystemSpeech};

pub struct ResponderGateway {
    generator: Arc<dyn Generator>,
    speech: SpeechQueue,
}

impl ResponderGateway {
    /// Must be called inside a tokio runtime: the speech worker starts here.
    pub fn new(generator: Arc<dyn Generator>, speech: Arc<dyn SpeechEngine>) -> Self {
        Self {
            generator,
            speech: SpeechQueue::spawn(speech),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(generator_from_config(config), speech_from_config(config))
    }

    /// Handle for background tasks; the gateway itself stays with the session
    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generator.generate(prompt).await
    }

    /// Queue `text` behind any utterance already playing. Failures are logged
    /// by the queue, never returned.
    pub fn speak(&self, triggering_sequence: u64, text: &str) {
        self.speech.enqueue(triggering_sequence, text);
    }
}

pub fn generator_from_config(config: &Config) -> Arc<dyn Generator> {
    let provider = config.provider();
    let options = config.generation_options();
    info!(
        provider = provider.as_str(),
        model = %options.model,
        max_output_tokens = options.max_output_tokens,
        temperature = options.temperature,
        "configuring generator"
    );

    match (provider, config.api_key_for(provider)) {
        (Provider::Ollama, _) => Arc::new(OllamaClient::new(config.ollama_url(), options)),
        (Provider::Gemini, Some(key)) => Arc::new(GeminiClient::new(key, options)),
        (Provider::Claude, Some(key)) => Arc::new(ClaudeClient::new(key, options)),
        (Provider::OpenAI, Some(key)) => Arc::new(OpenAIClient::new(key, options)),
        (_, None) => Arc::new(Unconfigured::new(provider.display_name())),
    }
}

pub fn speech_from_config(config: &Config) -> Arc<dyn SpeechEngine> {
    if !config.speech_enabled() {
        info!("speech disabled in config");
        return Arc::new(SilentSpeech);
    }

    let configured = config
        .speech_command
        .as_deref()
        .and_then(SystemSpeech::from_command);

    match configured.or_else(SystemSpeech::detect) {
        Some(speech) => Arc::new(speech),
        None => {
            info!("no speech synthesizer found, replies will be silent");
            Arc::new(SilentSpeech)
        }
    }
}
