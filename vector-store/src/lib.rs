//! Vector index client for the chat backend.
//!
//! Wraps Qdrant behind an idempotent `upsert` and a filtered `query`:
//! - records are keyed by the logical `{tenant}_{visitor}_{filename}_{index}`
//!   id (mapped to a deterministic UUID point id, so re-upserting replaces)
//! - queries take a conjunction of exact-match metadata constraints and
//!   return ranked matches with score and metadata
//! - transport failures surface as [`IndexError::Unavailable`], never as a
//!   silent empty result

mod config;
mod error;
mod facade;
mod filters;
mod record;

pub use config::IndexConfig;
pub use error::IndexError;
pub use record::{
    ChunkMeta, FIELD_FILENAME, FIELD_RECORD_ID, FIELD_TENANT_ID, FIELD_TEXT, FIELD_VISITOR_ID,
    MetadataFilter, VectorMatch, VectorRecord, stable_point_id,
};

use qdrant_client::qdrant::{PointId, PointStruct, Value as QValue, Vector, Vectors, value, vectors};
use std::collections::HashMap;
use tracing::trace;

/// High-level facade over the Qdrant collection.
///
/// Constructed once at startup and shared across requests.
pub struct VectorStore {
    cfg: IndexConfig,
    client: facade::QdrantFacade,
}

impl VectorStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `IndexError` if the client initialization fails.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        trace!("VectorStore::new collection={}", cfg.collection);
        let client = facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// Ensures the backing collection exists. Called once at startup.
    ///
    /// # Errors
    /// Returns `IndexError::Unavailable` if Qdrant cannot be reached.
    pub async fn ensure_ready(&self) -> Result<(), IndexError> {
        self.client.ensure_collection(self.cfg.dim).await
    }

    /// Batch-upserts records. Idempotent by record id: re-upserting the
    /// same id replaces its vector and metadata.
    ///
    /// # Errors
    /// Returns `IndexError::VectorSizeMismatch` if any embedding does not
    /// match the configured dimensionality, or `IndexError::Unavailable` on
    /// Qdrant failures.
    pub async fn upsert(&self, records: Vec<VectorRecord>) -> Result<u64, IndexError> {
        let mut points = Vec::with_capacity(records.len());
        for r in records {
            if r.embedding.len() != self.cfg.dim {
                return Err(IndexError::VectorSizeMismatch {
                    got: r.embedding.len(),
                    want: self.cfg.dim,
                });
            }
            points.push(build_point(r));
        }
        self.client.upsert_points(points).await
    }

    /// Queries the index with a ready embedding and a metadata filter.
    ///
    /// Matches are ordered by descending similarity; score ties are broken
    /// by Qdrant deterministically within a single call.
    ///
    /// # Errors
    /// Returns `IndexError::Unavailable` on Qdrant failures.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: &MetadataFilter,
    ) -> Result<Vec<VectorMatch>, IndexError> {
        trace!("VectorStore::query top_k={top_k}");
        let qfilter = filters::to_qdrant_filter(filter);
        let hits = self.client.search(vector, top_k, Some(qfilter)).await?;

        let mut out = Vec::with_capacity(hits.len());
        for (score, payload) in hits {
            out.push(VectorMatch {
                id: payload_str(&payload, FIELD_RECORD_ID),
                score,
                meta: ChunkMeta {
                    tenant_id: payload_str(&payload, FIELD_TENANT_ID),
                    visitor_id: payload_str(&payload, FIELD_VISITOR_ID),
                    filename: payload_str(&payload, FIELD_FILENAME),
                    text: payload_str(&payload, FIELD_TEXT),
                },
            });
        }
        Ok(out)
    }
}

fn payload_str(payload: &serde_json::Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Builds a Qdrant point from a record: UUIDv5 point id + compact payload.
fn build_point(r: VectorRecord) -> PointStruct {
    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert(FIELD_RECORD_ID.into(), qstring(&r.id));
    payload.insert(FIELD_TENANT_ID.into(), qstring(&r.meta.tenant_id));
    payload.insert(FIELD_VISITOR_ID.into(), qstring(&r.meta.visitor_id));
    payload.insert(FIELD_FILENAME.into(), qstring(&r.meta.filename));
    payload.insert(FIELD_TEXT.into(), qstring(&r.meta.text));

    let pid: PointId = stable_point_id(&r.id).to_string().into();

    let vectors = Vectors {
        vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
            data: r.embedding,
            indices: None,
            vectors_count: None,
            vector: None,
        })),
    };

    PointStruct {
        id: Some(pid),
        payload,
        vectors: Some(vectors),
        ..Default::default()
    }
}

/// Wraps a string into a Qdrant `Value`.
fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}
