//! Core data models used by the index client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload field holding the logical record id.
pub const FIELD_RECORD_ID: &str = "record_id";
/// Payload field holding the owning tenant id. Every stored record must
/// carry it; cross-tenant reads are a correctness violation.
pub const FIELD_TENANT_ID: &str = "tenant_id";
/// Payload field holding the visitor partition key.
pub const FIELD_VISITOR_ID: &str = "visitor_id";
/// Payload field holding the source filename.
pub const FIELD_FILENAME: &str = "filename";
/// Payload field holding the raw chunk text.
pub const FIELD_TEXT: &str = "text";

/// Metadata attached to every stored vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub tenant_id: String,
    pub visitor_id: String,
    pub filename: String,
    /// Raw chunk text, returned verbatim on retrieval.
    pub text: String,
}

/// A record to upsert: logical id + embedding + metadata.
///
/// The logical id is the `{tenant}_{visitor}_{filename}_{index}` composite;
/// re-upserting the same id replaces the stored vector and payload.
#[derive(Clone, Debug)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub meta: ChunkMeta,
}

/// A single retrieval hit, ordered by descending similarity.
#[derive(Clone, Debug)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub meta: ChunkMeta,
}

/// Conjunction of exact-match payload equality constraints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub equals: Vec<(String, String)>,
}

impl MetadataFilter {
    /// Filter scoped to a tenant and one of its visitors.
    pub fn tenant_visitor(tenant_id: &str, visitor_id: &str) -> Self {
        Self {
            equals: vec![
                (FIELD_TENANT_ID.into(), tenant_id.into()),
                (FIELD_VISITOR_ID.into(), visitor_id.into()),
            ],
        }
    }

    /// Relaxed filter scoped to a tenant only. Used as the documented
    /// fallback when a visitor-scoped query returns nothing; it never
    /// crosses the tenant boundary.
    pub fn tenant(tenant_id: &str) -> Self {
        Self {
            equals: vec![(FIELD_TENANT_ID.into(), tenant_id.into())],
        }
    }
}

/// Deterministic UUIDv5 for a logical record id.
///
/// Qdrant point ids must be u64 or UUID; deriving them from the logical id
/// keeps upserts idempotent per `{tenant}_{visitor}_{filename}_{index}`.
pub fn stable_point_id(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable() {
        let a = stable_point_id("t1_v1_foo.txt_0");
        let b = stable_point_id("t1_v1_foo.txt_0");
        let c = stable_point_id("t1_v1_foo.txt_1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn filters_scope_as_expected() {
        let f = MetadataFilter::tenant_visitor("t1", "v1");
        assert_eq!(f.equals.len(), 2);
        let f = MetadataFilter::tenant("t1");
        assert_eq!(f.equals, vec![("tenant_id".to_string(), "t1".to_string())]);
    }
}
