//! GET /analytics — per-tenant usage aggregates for the dashboard.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{auth::OwnerTenant, error::ApiResult, state::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub conversation_count: i64,
    pub common_questions: Vec<QuestionStat>,
}

#[derive(Serialize)]
pub struct QuestionStat {
    pub question: String,
    pub count: i64,
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    OwnerTenant(tenant): OwnerTenant,
) -> ApiResult<Json<AnalyticsResponse>> {
    let snapshot = state.store.analytics(&tenant.id).await?;
    Ok(Json(AnalyticsResponse {
        conversation_count: snapshot.conversation_count,
        common_questions: snapshot
            .common_questions
            .into_iter()
            .map(|(question, count)| QuestionStat { question, count })
            .collect(),
    }))
}
