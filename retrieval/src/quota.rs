//! Admission control preceding costly operations.
//!
//! Free-tier tenants are capped at [`FREE_UPLOAD_LIMIT`] uploads and
//! [`FREE_QUESTION_LIMIT`] questions. Paid tenants with an active
//! subscription are uncapped; paid tenants whose subscription is inactive
//! or pending are constrained exactly like the free tier. The gate only
//! reads counters; increments happen after the operation succeeds, so two
//! concurrent near-cap requests can overshoot by at most the number of
//! in-flight requests (accepted soft-quota behavior).

use tenant_store::{Plan, SubscriptionStatus, Tenant};

use crate::error::EngineError;

/// Fixed upgrade-prompt message surfaced on every quota rejection, so
/// client UIs can pattern-match it.
pub const UPGRADE_MESSAGE: &str = "You have reached your plan limit. \
Upgrade to the paid plan for unlimited questions and uploads.";

/// Free-tier cap on counted document ingestions.
pub const FREE_UPLOAD_LIMIT: i64 = 5;
/// Free-tier cap on counted questions.
pub const FREE_QUESTION_LIMIT: i64 = 20;

/// Per-tenant admission decisions, keyed on plan tier and counters.
pub struct QuotaGate;

impl QuotaGate {
    /// Whether the tenant's plan bypasses caps entirely.
    fn is_unlimited(tenant: &Tenant) -> bool {
        tenant.plan == Plan::Paid && tenant.subscription_status == SubscriptionStatus::Active
    }

    /// Admission check for a document ingestion.
    ///
    /// # Errors
    /// [`EngineError::QuotaExceeded`] with the fixed upgrade message when
    /// the upload cap is reached. No side effects occur on rejection.
    pub fn check_upload(tenant: &Tenant) -> Result<(), EngineError> {
        if Self::is_unlimited(tenant) {
            return Ok(());
        }
        if tenant.upload_count >= FREE_UPLOAD_LIMIT {
            return Err(EngineError::QuotaExceeded(UPGRADE_MESSAGE.into()));
        }
        Ok(())
    }

    /// Admission check for a question.
    ///
    /// # Errors
    /// [`EngineError::QuotaExceeded`] with the fixed upgrade message when
    /// the question cap is reached.
    pub fn check_question(tenant: &Tenant) -> Result<(), EngineError> {
        if Self::is_unlimited(tenant) {
            return Ok(());
        }
        if tenant.question_count >= FREE_QUESTION_LIMIT {
            return Err(EngineError::QuotaExceeded(UPGRADE_MESSAGE.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tenant_store::WidgetSettings;

    fn tenant(plan: Plan, status: SubscriptionStatus, uploads: i64, questions: i64) -> Tenant {
        Tenant {
            id: "t1".into(),
            plan,
            subscription_status: status,
            upload_count: uploads,
            question_count: questions,
            allowed_origins: vec![],
            widget_settings: WidgetSettings::default(),
            api_key: "ck_test".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn free_tier_is_capped() {
        let t = tenant(Plan::Free, SubscriptionStatus::Inactive, 4, 19);
        assert!(QuotaGate::check_upload(&t).is_ok());
        assert!(QuotaGate::check_question(&t).is_ok());

        let t = tenant(Plan::Free, SubscriptionStatus::Inactive, 5, 20);
        assert!(matches!(
            QuotaGate::check_upload(&t),
            Err(EngineError::QuotaExceeded(msg)) if msg == UPGRADE_MESSAGE
        ));
        assert!(matches!(
            QuotaGate::check_question(&t),
            Err(EngineError::QuotaExceeded(_))
        ));
    }

    #[test]
    fn active_paid_is_uncapped() {
        let t = tenant(Plan::Paid, SubscriptionStatus::Active, 500, 5000);
        assert!(QuotaGate::check_upload(&t).is_ok());
        assert!(QuotaGate::check_question(&t).is_ok());
    }

    #[test]
    fn inactive_paid_is_treated_as_free() {
        for status in [SubscriptionStatus::Inactive, SubscriptionStatus::Pending] {
            let t = tenant(Plan::Paid, status, 5, 20);
            assert!(matches!(
                QuotaGate::check_upload(&t),
                Err(EngineError::QuotaExceeded(_))
            ));
            assert!(matches!(
                QuotaGate::check_question(&t),
                Err(EngineError::QuotaExceeded(_))
            ));
        }
    }
}
