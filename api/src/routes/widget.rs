//! Widget bootstrap and configuration routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::Html,
};

use tenant_store::WidgetSettings;

use crate::{auth::OwnerTenant, error::ApiResult, routes::StatusResponse, state::AppState};

/// Handler: GET /widget/settings/{tenant_id}
///
/// Public: the embedded widget fetches its display configuration before
/// the visitor has any credential.
pub async fn widget_settings(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<WidgetSettings>> {
    let tenant = state.store.tenant(&tenant_id).await?;
    Ok(Json(tenant.widget_settings))
}

/// Handler: POST /widget/settings
pub async fn update_widget_settings(
    State(state): State<Arc<AppState>>,
    OwnerTenant(tenant): OwnerTenant,
    Json(settings): Json<WidgetSettings>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .store
        .update_widget_settings(&tenant.id, &settings)
        .await?;
    Ok(Json(StatusResponse::OK))
}

/// Handler: GET /widget/{tenant_id}
///
/// Returns the copy-paste embed snippet for the tenant's site. The snippet
/// carries the tenant api key, which is the widget's chat credential.
pub async fn widget_embed(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Html<String>> {
    let tenant = state.store.tenant(&tenant_id).await?;
    let snippet = format!(
        "<script src=\"{}/widget.js\" data-api-key=\"{}\" async></script>\n",
        state.public_base_url, tenant.api_key
    );
    Ok(Html(snippet))
}
