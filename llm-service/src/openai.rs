//! OpenAI-compatible service for chat completions and embeddings.
//!
//! Minimal, non-streaming client around the REST API. Endpoints are derived
//! from `LlmConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions — chat completion
//! - POST {endpoint}/v1/embeddings       — embeddings retrieval
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LlmConfig;
use crate::error::{LlmError, make_snippet};

/// Thin client for an OpenAI-style API.
///
/// Constructed once at startup and shared across requests; the inner
/// `reqwest::Client` is safe for concurrent use.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmError::MissingVar`] if the API key is empty
    /// - [`LlmError::InvalidEndpoint`] if the endpoint scheme is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmConfig) -> Result<Self, LlmError> {
        if cfg.api_key.trim().is_empty() {
            return Err(LlmError::MissingVar("OPENAI_API_KEY"));
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
                .map_err(|e| LlmError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);
        let url_embeddings = format!("{}/v1/embeddings", base);

        info!(
            chat_model = %cfg.chat_model,
            embed_model = %cfg.embed_model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a non-streaming chat completion with a system instruction
    /// and a single user message.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Decode`] if the JSON cannot be parsed
    /// - [`LlmError::EmptyChoices`] if no choices are returned
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model: &self.cfg.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(
            model = %self.cfg.chat_model,
            user_len = user.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.chat_model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(LlmError::EmptyChoices)?;

        info!(
            model = %self.cfg.chat_model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves a single embeddings vector for `input`.
    ///
    /// # Errors
    /// - [`LlmError::EmptyInput`] if the trimmed input is empty
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Decode`] / [`LlmError::EmptyEmbedding`] on bad payloads
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.embed_model,
            input,
        };

        debug!(
            model = %self.cfg.embed_model,
            input_len = input.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.embed_model,
                latency_ms = started.elapsed().as_millis(),
                "embeddings call returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!("serde error: {e}; expected `data[0].embedding`"))
        })?;

        let first = out
            .data
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyEmbedding)?;

        info!(
            model = %self.cfg.embed_model,
            latency_ms = started.elapsed().as_millis(),
            dim = first.embedding.len(),
            "embeddings completed"
        );

        Ok(first.embedding)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str, key: &str) -> LlmConfig {
        LlmConfig {
            endpoint: endpoint.into(),
            api_key: key.into(),
            chat_model: "gpt-3.5-turbo".into(),
            embed_model: "text-embedding-ada-002".into(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn rejects_bad_endpoint_scheme() {
        let err = OpenAiService::new(cfg("ftp://example.com", "sk-test")).unwrap_err();
        assert!(matches!(err, LlmError::InvalidEndpoint(_)));
    }

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenAiService::new(cfg("https://api.openai.com", "  ")).unwrap_err();
        assert!(matches!(err, LlmError::MissingVar(_)));
    }

    #[test]
    fn derives_urls_without_trailing_slash() {
        let svc = OpenAiService::new(cfg("https://api.openai.com/", "sk-test")).unwrap();
        assert_eq!(svc.url_chat, "https://api.openai.com/v1/chat/completions");
        assert_eq!(svc.url_embeddings, "https://api.openai.com/v1/embeddings");
    }

    #[tokio::test]
    async fn embed_rejects_empty_input() {
        let svc = OpenAiService::new(cfg("https://api.openai.com", "sk-test")).unwrap();
        let err = svc.embed("   ").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyInput));
    }
}
