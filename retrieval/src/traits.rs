//! Collaborator seams for the pipeline.

use async_trait::async_trait;

use crate::error::EngineError;
use vector_store::{MetadataFilter, VectorMatch, VectorRecord};

/// Maps text to a fixed-length embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError>;
}

/// Generates text from a system instruction and a user turn.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, EngineError>;
}

/// Idempotent vector storage with filtered similarity search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Batch upsert; re-upserting a record id replaces it.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), EngineError>;

    /// Ranked matches for `vector` under a conjunction of exact-match
    /// metadata constraints. A transport failure is an error, never an
    /// empty result.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorMatch>, EngineError>;
}
