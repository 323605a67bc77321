//! The store trait consumed by the pipeline and the HTTP layer.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{AnalyticsSnapshot, ChatRecord, Plan, Tenant, WidgetSettings};

/// Persistent records: tenants (with usage counters), conversation history
/// and analytics aggregates.
///
/// Implementations must be safe for concurrent use; counter increments must
/// be atomic at the statement level.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a tenant on the given plan, issuing a fresh opaque api key.
    async fn create_tenant(
        &self,
        plan: Plan,
        allowed_origins: &[String],
    ) -> Result<Tenant, StoreError>;

    /// Fetches a tenant by id.
    async fn tenant(&self, id: &str) -> Result<Tenant, StoreError>;

    /// Fetches a tenant by its widget api key.
    async fn tenant_by_api_key(&self, api_key: &str) -> Result<Tenant, StoreError>;

    /// Atomically increments the upload counter by one.
    async fn increment_upload_count(&self, id: &str) -> Result<(), StoreError>;

    /// Atomically increments the question counter by one.
    async fn increment_question_count(&self, id: &str) -> Result<(), StoreError>;

    /// Replaces the tenant's widget display configuration.
    async fn update_widget_settings(
        &self,
        id: &str,
        settings: &WidgetSettings,
    ) -> Result<(), StoreError>;

    /// Appends a conversation record. Records are never mutated afterwards.
    async fn append_chat(&self, record: &ChatRecord) -> Result<(), StoreError>;

    /// Conversation history for a tenant/visitor pair, ascending by time.
    async fn history(&self, tenant_id: &str, visitor_id: &str)
    -> Result<Vec<ChatRecord>, StoreError>;

    /// Bumps the analytics aggregates for a question. Best effort: callers
    /// log failures and continue.
    async fn record_question(&self, tenant_id: &str, question: &str) -> Result<(), StoreError>;

    /// Reads the analytics aggregates for a tenant.
    async fn analytics(&self, tenant_id: &str) -> Result<AnalyticsSnapshot, StoreError>;
}
