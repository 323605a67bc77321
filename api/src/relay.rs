//! Outbound message relay for the messaging webhook.
//!
//! The webhook handler replies through this seam; production uses the
//! Twilio REST API, and deployments without Twilio credentials fall back
//! to a no-op relay that only logs.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("relay rejected the message: {status}")]
    Rejected { status: reqwest::StatusCode },
}

/// Delivers a text message to an external recipient address.
#[async_trait]
pub trait MessageRelay: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), RelayError>;
}

/// Twilio messaging relay. The recipient address carries its channel
/// prefix (e.g. "whatsapp:+155500001") exactly as received on the inbound
/// webhook.
pub struct TwilioRelay {
    client: reqwest::Client,
    url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioRelay {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from: String,
    ) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let url = format!("https://api.twilio.com/2010-04-01/Accounts/{account_sid}/Messages.json");
        Ok(Self {
            client,
            url,
            account_sid,
            auth_token,
            from,
        })
    }
}

#[async_trait]
impl MessageRelay for TwilioRelay {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), RelayError> {
        let params = [("To", to), ("From", self.from.as_str()), ("Body", body)];
        let resp = self
            .client
            .post(&self.url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            error!(%status, to, "outbound message rejected");
            return Err(RelayError::Rejected { status });
        }

        info!(to, body_len = body.len(), "outbound message delivered");
        Ok(())
    }
}

/// Relay used when no messaging credentials are configured.
pub struct NoopRelay;

#[async_trait]
impl MessageRelay for NoopRelay {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), RelayError> {
        info!(to, body_len = body.len(), "messaging relay disabled, dropping reply");
        Ok(())
    }
}

/// Picks the relay from TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN /
/// TWILIO_WHATSAPP_FROM; any of them missing selects the no-op relay.
pub fn from_env() -> Result<Arc<dyn MessageRelay>, RelayError> {
    match (
        env::var("TWILIO_ACCOUNT_SID"),
        env::var("TWILIO_AUTH_TOKEN"),
        env::var("TWILIO_WHATSAPP_FROM"),
    ) {
        (Ok(sid), Ok(token), Ok(from)) if !sid.is_empty() && !token.is_empty() => {
            Ok(Arc::new(TwilioRelay::new(sid, token, from)?))
        }
        _ => {
            info!("Twilio credentials not configured, using no-op relay");
            Ok(Arc::new(NoopRelay))
        }
    }
}
