//! POST /upload — ingest a document into the tenant's corpus.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    auth::OwnerTenant,
    error::{ApiError, ApiResult},
    routes::StatusResponse,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub text: Option<String>,
    pub filename: Option<String>,
    pub visitor_id: Option<String>,
}

/// Handler: POST /upload
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/upload \
///   -H 'authorization: Bearer ck_...' \
///   -H 'content-type: application/json' \
///   -d '{"filename":"faq.txt","text":"..."}'
/// ```
pub async fn upload(
    State(state): State<Arc<AppState>>,
    OwnerTenant(tenant): OwnerTenant,
    Json(body): Json<UploadRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let text = body
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("text is required".into()))?;
    let filename = body
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("filename is required".into()))?;

    state
        .pipeline
        .ingest_document(&tenant, body.visitor_id.as_deref(), &filename, &text)
        .await?;

    Ok(Json(StatusResponse::OK))
}
