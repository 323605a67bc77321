//! GET /user/plan — plan tier and usage counters for the calling tenant.

use axum::Json;
use serde::Serialize;

use tenant_store::{Plan, SubscriptionStatus};

use crate::auth::ApiKeyTenant;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub plan: Plan,
    pub subscription_status: SubscriptionStatus,
    pub upload_count: i64,
    pub question_count: i64,
}

pub async fn plan(ApiKeyTenant(tenant): ApiKeyTenant) -> Json<PlanResponse> {
    Json(PlanResponse {
        plan: tenant.plan,
        subscription_status: tenant.subscription_status,
        upload_count: tenant.upload_count,
        question_count: tenant.question_count,
    })
}
