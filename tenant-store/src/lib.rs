//! Tenant, conversation and analytics records.
//!
//! The rest of the workspace talks to [`RecordStore`], an object-safe trait;
//! [`SqliteStore`] is the production implementation. Counter updates are
//! single atomic `UPDATE ... SET c = c + 1` statements; the admission gate
//! reads counters separately, which is the documented soft-quota race.

mod error;
mod models;
mod sqlite;
mod store;

pub use error::StoreError;
pub use models::{
    AnalyticsSnapshot, ChatRecord, Plan, SubscriptionStatus, Tenant, WidgetSettings,
};
pub use sqlite::SqliteStore;
pub use store::RecordStore;
