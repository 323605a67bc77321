//! Credential extractors.
//!
//! Widget traffic authenticates with the tenant api key in `x-api-key`;
//! tenant-owner calls present the same key as a bearer token. Both resolve
//! the tenant through the record store; unknown or missing credentials map
//! to a generic 401 without distinguishing the two cases.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tenant_store::Tenant;

use crate::{error::ApiError, state::AppState};

/// Tenant resolved from the `x-api-key` header (widget/public traffic).
pub struct ApiKeyTenant(pub Tenant);

impl FromRequestParts<Arc<AppState>> for ApiKeyTenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let tenant = state
            .store
            .tenant_by_api_key(key)
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(Self(tenant))
    }
}

/// Tenant resolved from an `Authorization: Bearer` credential (owner
/// operations: uploads, widget configuration, analytics).
pub struct OwnerTenant(pub Tenant);

impl FromRequestParts<Arc<AppState>> for OwnerTenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let tenant = state
            .store
            .tenant_by_api_key(token)
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(Self(tenant))
    }
}
