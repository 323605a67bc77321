//! Shared LLM client for the chat backend.
//!
//! Wraps an OpenAI-compatible REST API behind two operations:
//! - `embed` — text → fixed-length vector (`POST {endpoint}/v1/embeddings`)
//! - `complete` — system + user message → generated text
//!   (`POST {endpoint}/v1/chat/completions`, non-streaming)
//!
//! All failures are normalized into [`LlmError`]; callers never see raw
//! upstream response bodies beyond a trimmed snippet in logs.

mod config;
mod error;
mod openai;

pub use config::LlmConfig;
pub use error::{LlmError, make_snippet, must_env};
pub use openai::OpenAiService;
