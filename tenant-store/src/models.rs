//! Record shapes owned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Billing plan tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Paid,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Paid => "paid",
        }
    }

    /// Parses a stored plan string; unknown values degrade to `Free`.
    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => Plan::Paid,
            _ => Plan::Free,
        }
    }
}

/// Subscription status, driven externally by billing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Pending,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Pending => "pending",
        }
    }

    /// Parses a stored status string; unknown values degrade to `Inactive`.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "pending" => SubscriptionStatus::Pending,
            _ => SubscriptionStatus::Inactive,
        }
    }
}

/// Embeddable-widget display configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

/// A registered account owning uploaded content and a widget.
///
/// Counters are non-negative and monotonically non-decreasing within a plan
/// period; they are reset only by an external billing process. The api key
/// is unique and immutable once issued.
#[derive(Clone, Debug)]
pub struct Tenant {
    pub id: String,
    pub plan: Plan,
    pub subscription_status: SubscriptionStatus,
    pub upload_count: i64,
    pub question_count: i64,
    pub allowed_origins: Vec<String>,
    pub widget_settings: WidgetSettings,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

/// One question/answer turn, keyed by tenant and visitor. Append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRecord {
    pub tenant_id: String,
    pub visitor_id: String,
    pub message: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

/// Best-effort per-tenant usage telemetry.
#[derive(Clone, Debug, Default)]
pub struct AnalyticsSnapshot {
    pub conversation_count: i64,
    /// Distinct question strings with occurrence counts.
    pub common_questions: Vec<(String, i64)>,
}
