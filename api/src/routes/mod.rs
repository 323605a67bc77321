//! HTTP handlers. Each handler validates transport-level input and
//! delegates to the pipeline or the store; no business rules live here.

pub mod analytics;
pub mod chat;
pub mod history;
pub mod plan;
pub mod upload;
pub mod whatsapp;
pub mod widget;

use serde::Serialize;

/// Minimal acknowledgment body for mutating routes.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub const OK: Self = Self { status: "ok" };
}
