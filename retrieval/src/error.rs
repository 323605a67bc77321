//! Error taxonomy for the retrieval core.
//!
//! Maps onto the request-level taxonomy: validation and quota failures are
//! user-correctable, upstream failures are 5xx material and logged with
//! context by the transport layer.

use tenant_store::StoreError;
use thiserror::Error;

/// Top-level error for pipeline operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed caller input.
    #[error("{0}")]
    InvalidInput(String),

    /// Visitor id is missing or not a valid identifier string.
    #[error("invalid visitor id")]
    InvalidVisitor,

    /// Soft quota limit reached; carries the fixed upgrade-prompt message.
    /// Not a system fault.
    #[error("{0}")]
    QuotaExceeded(String),

    /// Unknown tenant or record.
    #[error("not found")]
    NotFound,

    /// Embedding/index/completion transport failure.
    #[error("upstream failure in {stage}: {source}")]
    Upstream {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Record store failure.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Wraps a collaborator failure with the pipeline stage it occurred in.
    pub fn upstream(
        stage: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        EngineError::Upstream {
            stage,
            source: Box::new(source),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => EngineError::NotFound,
            other => EngineError::Store(other),
        }
    }
}
