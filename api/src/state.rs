//! Shared state for all HTTP handlers.

use std::sync::Arc;

use tracing::info;

use llm_service::{LlmConfig, OpenAiService};
use retrieval::RetrievalPipeline;
use tenant_store::{RecordStore, SqliteStore};
use vector_store::{IndexConfig, VectorStore};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::relay::{self, MessageRelay};

/// Handler state, built once at startup and shared behind an `Arc`.
pub struct AppState {
    pub pipeline: RetrievalPipeline,
    pub store: Arc<dyn RecordStore>,
    pub relay: Arc<dyn MessageRelay>,
    /// Tenant inbound webhook messages are answered as. Unset disables the
    /// webhook (it still acknowledges, see the handler).
    pub whatsapp_tenant: Option<String>,
    /// Base URL baked into widget embed snippets.
    pub public_base_url: String,
}

impl AppState {
    /// Wires the production collaborators from environment configuration.
    ///
    /// # Errors
    /// [`ApiError::Config`] when a client cannot be constructed or a
    /// backing service cannot be reached during bootstrap.
    pub async fn from_env(cfg: &ApiConfig) -> Result<Self, ApiError> {
        let llm = Arc::new(
            OpenAiService::new(LlmConfig::from_env().map_err(config_err)?).map_err(config_err)?,
        );

        let index = Arc::new(VectorStore::new(IndexConfig::from_env().map_err(config_err)?)
            .map_err(config_err)?);
        index.ensure_ready().await.map_err(config_err)?;

        let store = Arc::new(
            SqliteStore::connect(&cfg.database_path)
                .await
                .map_err(config_err)?,
        );

        let relay = relay::from_env().map_err(config_err)?;

        info!(
            database = %cfg.database_path,
            whatsapp_tenant = cfg.whatsapp_tenant.as_deref().unwrap_or("<disabled>"),
            "application state initialized"
        );

        let pipeline =
            RetrievalPipeline::new(llm.clone(), index, llm, store.clone() as Arc<dyn RecordStore>);

        Ok(Self {
            pipeline,
            store,
            relay,
            whatsapp_tenant: cfg.whatsapp_tenant.clone(),
            public_base_url: cfg.public_base_url.clone(),
        })
    }
}

fn config_err(err: impl std::fmt::Display) -> ApiError {
    ApiError::Config(err.to_string())
}
