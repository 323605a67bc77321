//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! Concentrates all Qdrant interactions behind a minimal API, hiding the
//! verbose builder pattern and keeping the rest of the workspace decoupled
//! from `qdrant-client`.

use crate::config::IndexConfig;
use crate::error::IndexError;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, Filter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
};
use tracing::{debug, info, warn};

/// A facade over the Qdrant client.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
        })
    }

    /// Ensures that the collection exists.
    ///
    /// - If the collection already exists → no-op.
    /// - If missing → creates it with cosine distance and the given size.
    pub async fn ensure_collection(&self, size: usize) -> Result<(), IndexError> {
        info!(
            "Ensuring collection '{}' with size={} distance=Cosine",
            self.collection, size
        );

        match self.client.collection_info(&self.collection).await {
            Ok(_) => {
                debug!("Collection '{}' already exists", self.collection);
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "Collection '{}' not found, will be created (error={})",
                    self.collection, err
                );
            }
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(size as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        info!("Collection '{}' created successfully", self.collection);
        Ok(())
    }

    /// Upserts (inserts or updates) a batch of points into the collection.
    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<u64, IndexError> {
        if points.is_empty() {
            debug!("No points provided for upsert");
            return Ok(0);
        }

        info!(
            "Upserting {} points into collection '{}'",
            points.len(),
            self.collection
        );

        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        debug!("Upsert operation result={:?}", res.result);

        Ok(res.result.and_then(|r| r.operation_id).unwrap_or(0))
    }

    /// Performs a similarity search, returning `(score, payload)` tuples
    /// sorted by descending score.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<(f32, serde_json::Value)>, IndexError> {
        debug!(
            "Searching in '{}' with top_k={} filtered={}",
            self.collection,
            top_k,
            filter.is_some()
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

        if let Some(f) = filter {
            builder = builder.filter(f);
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let mut out = Vec::with_capacity(res.result.len());
        for r in res.result.into_iter() {
            let score = r.score;
            let payload_json = qpayload_to_json(r.payload);
            out.push((score, payload_json));
        }

        debug!("Search completed: {} hits returned", out.len());
        Ok(out)
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Unsupported nested objects/arrays are mapped to `Null`.
fn qpayload_to_json(mut p: std::collections::HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            None => serde_json::Value::Null,
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}
