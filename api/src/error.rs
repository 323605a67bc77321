//! Request-level error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl
//! renders a stable machine-readable code plus a human message. Upstream
//! and store failures are logged here with their full source chain and
//! surfaced to clients as generic 5xx bodies, never with upstream text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use retrieval::EngineError;
use tenant_store::StoreError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum ApiError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("missing or unknown credentials")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    /// Plan limit reached; carries the fixed upgrade-prompt message.
    #[error("{0}")]
    Quota(String),

    #[error("upstream service failure")]
    Upstream,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only, never produced by a handler
            ApiError::Config(_) | ApiError::Bind(_) | ApiError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Quota(_) => StatusCode::FORBIDDEN,

            ApiError::Upstream => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Bind(_) => "BIND_ERROR",
            ApiError::Server(_) => "SERVER_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Quota(_) => "QUOTA_EXCEEDED",
            ApiError::Upstream => "UPSTREAM_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            EngineError::InvalidVisitor => ApiError::BadRequest("invalid visitor id".into()),
            EngineError::QuotaExceeded(msg) => ApiError::Quota(msg),
            EngineError::NotFound => ApiError::NotFound,
            EngineError::Upstream { .. } => {
                error!(error = %err, "pipeline upstream failure");
                ApiError::Upstream
            }
            EngineError::Store(_) => {
                error!(error = %err, "pipeline store failure");
                ApiError::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            other => {
                error!(error = %other, "record store failure");
                ApiError::Internal
            }
        }
    }
}

/// Handy result alias used across handlers.
pub type ApiResult<T> = Result<T, ApiError>;
