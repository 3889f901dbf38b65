//! Error types for the gateway boundary.

/// Anything that can go wrong asking a provider for a reply.
///
/// Every variant renders to a single human-readable message; the orchestrator
/// only ever shows that message to the user.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network, TLS or timeout failure before a response arrived.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider answered 2xx but the body was not a usable reply.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The selected provider has no credentials.
    #[error("{0} API key not configured")]
    NotConfigured(&'static str),
}

/// Failure driving the speech device. Never shown as a turn.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// No synthesizer could be found or started.
    #[error("speech device unavailable: {0}")]
    Unavailable(String),

    /// The synthesizer ran but reported failure.
    #[error("speech failed: {0}")]
    Failed(String),

    /// I/O error talking to the synthesizer process.
    #[error("speech I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure loading the on-disk configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
