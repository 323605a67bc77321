//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for vector index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Qdrant transport or server failure. Must surface to callers as a
    /// retrieval failure, never as a silent empty result.
    #[error("index unavailable: {0}")]
    Unavailable(String),
}
