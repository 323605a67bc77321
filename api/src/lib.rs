//! HTTP surface of the chat backend.
//!
//! Thin transport layer: auth extractors resolve the calling tenant, the
//! handlers delegate to the retrieval pipeline and the record store, and
//! `ApiError` maps domain failures to status codes. Business rules live in
//! the `retrieval` crate.

mod auth;
mod config;
mod error;
mod relay;
mod routes;
mod state;


use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use config::ApiConfig;
pub use error::ApiError;
pub use relay::{MessageRelay, NoopRelay, RelayError, TwilioRelay};
pub use state::AppState;

/// Boots the server from environment configuration and serves until
/// Ctrl+C.
pub async fn start() -> Result<(), ApiError> {
    let cfg = ApiConfig::from_env();
    let state = Arc::new(AppState::from_env(&cfg).await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(ApiError::Bind)?;
    info!(address = %cfg.address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ApiError::Server)
}

/// Builds the application router. Public so route tests can drive it
/// without binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(routes::upload::upload))
        .route("/chat", post(routes::chat::chat))
        .route("/chats", get(routes::history::history))
        .route("/user/plan", get(routes::plan::plan))
        .route("/analytics", get(routes::analytics::analytics))
        .route("/widget/settings/{tenant_id}", get(routes::widget::widget_settings))
        .route("/widget/settings", post(routes::widget::update_widget_settings))
        .route("/widget/{tenant_id}", get(routes::widget::widget_embed))
        .route("/whatsapp", post(routes::whatsapp::whatsapp))
        .with_state(state)
}

/// Resolves when Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
