//! Runtime and collection configuration.

use crate::error::IndexError;

/// Configuration for the Qdrant-backed vector index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Embedding dimensionality enforced on upsert.
    pub dim: usize,
}

impl IndexConfig {
    /// Loads configuration from environment variables.
    ///
    /// Optional overrides: `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION`, `EMBEDDING_DIM` (default 1536, the
    /// `text-embedding-ada-002` width).
    pub fn from_env() -> Result<Self, IndexError> {
        let cfg = Self {
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".into()),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok().filter(|s| !s.is_empty()),
            collection: std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "chatlet".into()),
            dim: std::env::var("EMBEDDING_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1536),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(IndexError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(IndexError::Config("collection is empty".into()));
        }
        if self.dim == 0 {
            return Err(IndexError::Config("dim must be > 0".into()));
        }
        Ok(())
    }
}
