//! Core retrieval pipeline and admission control.
//!
//! This crate owns the behavior every entrypoint (authenticated API, public
//! widget API, messaging webhook) delegates to:
//! - **ingestion**: quota gate → chunk → embed (concurrent, all-or-nothing)
//!   → batch upsert tagged with tenant/visitor/filename/chunk index → one
//!   upload-counter increment per document
//! - **answering**: quota gate → embed question → tenant+visitor-filtered
//!   query → tenant-only fallback → context join → completion → persist
//!   conversation → question-counter increment
//!
//! External collaborators (embedding model, completion model, vector index,
//! record store) sit behind object-safe traits so the pipeline is testable
//! without the network.

mod adapters;
mod chunker;
mod error;
mod pipeline;
mod prompt;
mod quota;
mod traits;

pub use chunker::{Chunk, DEFAULT_CHUNK_CHARS, chunk_text};
pub use error::EngineError;
pub use pipeline::{DEFAULT_VISITOR, RetrievalPipeline, TOP_K};
pub use prompt::{NO_KNOWLEDGE_REPLY, SYSTEM_PROMPT};
pub use quota::{FREE_QUESTION_LIMIT, FREE_UPLOAD_LIMIT, QuotaGate, UPGRADE_MESSAGE};
pub use traits::{CompletionModel, Embedder, VectorIndex};
