//! Trait implementations over the concrete clients.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::traits::{CompletionModel, Embedder, VectorIndex};

use llm_service::OpenAiService;
use vector_store::{MetadataFilter, VectorMatch, VectorRecord, VectorStore};

#[async_trait]
impl Embedder for OpenAiService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        OpenAiService::embed(self, text)
            .await
            .map_err(|e| EngineError::upstream("embedding", e))
    }
}

#[async_trait]
impl CompletionModel for OpenAiService {
    async fn complete(&self, system: &str, user: &str) -> Result<String, EngineError> {
        OpenAiService::complete(self, system, user)
            .await
            .map_err(|e| EngineError::upstream("completion", e))
    }
}

#[async_trait]
impl VectorIndex for VectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), EngineError> {
        VectorStore::upsert(self, records)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::upstream("index upsert", e))
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorMatch>, EngineError> {
        VectorStore::query(self, vector, top_k, filter)
            .await
            .map_err(|e| EngineError::upstream("index query", e))
    }
}
