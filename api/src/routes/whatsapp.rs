//! POST /whatsapp — inbound messaging webhook.
//!
//! The provider retries on non-2xx, so this route acknowledges with 200
//! unconditionally. Failures are logged and, where a sender address is
//! known, turned into a fallback text through the outbound relay.

use std::sync::Arc;

use axum::{Form, extract::State};
use serde::Deserialize;
use tracing::{info, warn};

use retrieval::{DEFAULT_VISITOR, EngineError};

use crate::state::AppState;

const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again later.";

#[derive(Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

pub async fn whatsapp(
    State(state): State<Arc<AppState>>,
    Form(form): Form<InboundMessage>,
) -> &'static str {
    handle_inbound(&state, form).await;
    "OK"
}

async fn handle_inbound(state: &AppState, form: InboundMessage) {
    let (Some(from), Some(body)) = (form.from, form.body) else {
        warn!("inbound webhook payload missing From/Body, dropping");
        return;
    };
    if body.trim().is_empty() {
        warn!(from = %from, "inbound webhook message is empty, dropping");
        return;
    }

    let Some(tenant_id) = state.whatsapp_tenant.as_deref() else {
        info!(from = %from, "no webhook tenant configured, dropping inbound message");
        return;
    };

    let reply = match resolve_reply(state, tenant_id, &body).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(tenant_id, error = %err, "inbound message handling failed");
            FALLBACK_REPLY.to_string()
        }
    };

    if let Err(err) = state.relay.send_text(&from, &reply).await {
        warn!(to = %from, error = %err, "outbound relay failed");
    }
}

async fn resolve_reply(
    state: &AppState,
    tenant_id: &str,
    body: &str,
) -> Result<String, EngineError> {
    let tenant = state.store.tenant(tenant_id).await?;
    match state.pipeline.answer(&tenant, DEFAULT_VISITOR, body).await {
        // The upgrade prompt reads fine as a plain text reply.
        Err(EngineError::QuotaExceeded(msg)) => Ok(msg),
        other => other,
    }
}
