//! POST /chat — answer a widget visitor's question.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use retrieval::EngineError;

use crate::{
    auth::ApiKeyTenant,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub visitor_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Handler: POST /chat
///
/// The widget always knows its visitor, so a missing `visitorId` is a
/// malformed request here, unlike `/upload` and the webhook.
///
/// Quota exhaustion is not an error on this route: the widget renders the
/// upgrade prompt as an ordinary bot message, so it comes back as a 200
/// with the fixed message in `reply`.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiKeyTenant(tenant): ApiKeyTenant,
    Json(body): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let visitor = body
        .visitor_id
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("visitorId is required".into()))?;

    match state.pipeline.answer(&tenant, visitor, &body.message).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(EngineError::QuotaExceeded(msg)) => {
            info!(tenant_id = %tenant.id, "question quota reached, replying with upgrade prompt");
            Ok(Json(ChatResponse { reply: msg }))
        }
        Err(err) => Err(err.into()),
    }
}
