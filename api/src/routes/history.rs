//! GET /chats — conversation history for one visitor.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::ApiKeyTenant,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub visitor_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub message: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

/// Handler: GET /chats?visitorId=...
///
/// Entries come back ascending by creation time.
pub async fn history(
    State(state): State<Arc<AppState>>,
    ApiKeyTenant(tenant): ApiKeyTenant,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ChatEntry>>> {
    let visitor = query
        .visitor_id
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("visitorId is required".into()))?;

    let records = state.pipeline.history(&tenant, &visitor).await?;
    let entries = records
        .into_iter()
        .map(|r| ChatEntry {
            message: r.message,
            reply: r.reply,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(entries))
}
