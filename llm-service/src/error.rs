//! Unified error handling for `llm-service`.
//!
//! A single top-level [`LlmError`] covers configuration, transport, and
//! protocol failures. Small env helpers return the same error type so that
//! startup code composes with `?`.

use reqwest::StatusCode;
use thiserror::Error;

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Endpoint did not start with `http://` or `https://`.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Embedding input was empty after trimming.
    #[error("embedding input must not be empty")]
    EmptyInput,

    /// Underlying HTTP transport error (connect, timeout, TLS).
    #[error("transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Upstream returned a non-successful HTTP status.
    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        /// Short trimmed snippet of the response body.
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("decode error: {0}")]
    Decode(String),

    /// Chat completion returned an empty `choices` array.
    #[error("completion returned no choices")]
    EmptyChoices,

    /// Embeddings response contained no data entries.
    #[error("embeddings response contained no data")]
    EmptyEmbedding,
}

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`LlmError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String, LlmError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LlmError::MissingVar(name)),
    }
}

/// Trims a response body down to a log-safe single-line snippet.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= MAX {
        flat
    } else {
        let mut end = MAX;
        while end > 0 && !flat.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &flat[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_flattens_and_truncates() {
        let s = make_snippet("a\n  b\tc");
        assert_eq!(s, "a b c");

        let long = "x".repeat(1000);
        let s = make_snippet(&long);
        assert!(s.chars().count() <= 241);
        assert!(s.ends_with('…'));
    }
}
