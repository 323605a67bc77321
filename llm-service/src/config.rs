//! Environment-driven configuration for the LLM client.

use crate::error::{LlmError, must_env};

/// Configuration for the OpenAI-compatible API client.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// API base, e.g. `https://api.openai.com`.
    pub endpoint: String,
    /// Bearer token for the API.
    pub api_key: String,
    /// Chat-completion model name.
    pub chat_model: String,
    /// Embedding model name.
    pub embed_model: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Loads configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required. Optional overrides:
    /// `OPENAI_API_BASE`, `CHAT_MODEL`, `EMBED_MODEL`, `LLM_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns [`LlmError::MissingVar`] when the API key is absent.
    pub fn from_env() -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            api_key: must_env("OPENAI_API_KEY")?,
            chat_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),
            embed_model: std::env::var("EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-ada-002".into()),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}
