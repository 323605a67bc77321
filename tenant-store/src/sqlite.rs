//! SQLite-backed implementation of [`RecordStore`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AnalyticsSnapshot, ChatRecord, Plan, SubscriptionStatus, Tenant, WidgetSettings,
};
use crate::store::RecordStore;

/// Production record store over a SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `path` and runs schema
    /// bootstrap.
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running record store schema bootstrap");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                plan TEXT NOT NULL,
                subscription_status TEXT NOT NULL,
                upload_count INTEGER NOT NULL DEFAULT 0,
                question_count INTEGER NOT NULL DEFAULT 0,
                allowed_origins TEXT NOT NULL DEFAULT '[]',
                widget_settings TEXT NOT NULL DEFAULT '{}',
                api_key TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id TEXT NOT NULL,
                visitor_id TEXT NOT NULL,
                message TEXT NOT NULL,
                reply TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chats_tenant_visitor \
             ON chats(tenant_id, visitor_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics (
                tenant_id TEXT PRIMARY KEY,
                conversation_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS question_stats (
                tenant_id TEXT NOT NULL,
                question TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (tenant_id, question)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Record store schema bootstrap completed");
        Ok(())
    }
}

fn tenant_from_row(row: &SqliteRow) -> Result<Tenant, StoreError> {
    let plan: String = row.try_get("plan")?;
    let status: String = row.try_get("subscription_status")?;
    let origins: String = row.try_get("allowed_origins")?;
    let settings: String = row.try_get("widget_settings")?;

    Ok(Tenant {
        id: row.try_get("id")?,
        plan: Plan::parse(&plan),
        subscription_status: SubscriptionStatus::parse(&status),
        upload_count: row.try_get("upload_count")?,
        question_count: row.try_get("question_count")?,
        allowed_origins: serde_json::from_str(&origins)?,
        widget_settings: serde_json::from_str(&settings)?,
        api_key: row.try_get("api_key")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create_tenant(
        &self,
        plan: Plan,
        allowed_origins: &[String],
    ) -> Result<Tenant, StoreError> {
        let tenant = Tenant {
            id: Uuid::new_v4().to_string(),
            plan,
            subscription_status: SubscriptionStatus::Inactive,
            upload_count: 0,
            question_count: 0,
            allowed_origins: allowed_origins.to_vec(),
            widget_settings: WidgetSettings::default(),
            api_key: format!("ck_{}", Uuid::new_v4().simple()),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO tenants \
             (id, plan, subscription_status, upload_count, question_count, \
              allowed_origins, widget_settings, api_key, created_at) \
             VALUES (?1, ?2, ?3, 0, 0, ?4, ?5, ?6, ?7)",
        )
        .bind(&tenant.id)
        .bind(tenant.plan.as_str())
        .bind(tenant.subscription_status.as_str())
        .bind(serde_json::to_string(&tenant.allowed_origins)?)
        .bind(serde_json::to_string(&tenant.widget_settings)?)
        .bind(&tenant.api_key)
        .bind(tenant.created_at)
        .execute(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn tenant(&self, id: &str) -> Result<Tenant, StoreError> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        tenant_from_row(&row)
    }

    async fn tenant_by_api_key(&self, api_key: &str) -> Result<Tenant, StoreError> {
        let row = sqlx::query("SELECT * FROM tenants WHERE api_key = ?1")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        tenant_from_row(&row)
    }

    async fn increment_upload_count(&self, id: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE tenants SET upload_count = upload_count + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn increment_question_count(&self, id: &str) -> Result<(), StoreError> {
        let res =
            sqlx::query("UPDATE tenants SET question_count = question_count + 1 WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_widget_settings(
        &self,
        id: &str,
        settings: &WidgetSettings,
    ) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE tenants SET widget_settings = ?1 WHERE id = ?2")
            .bind(serde_json::to_string(settings)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append_chat(&self, record: &ChatRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO chats (tenant_id, visitor_id, message, reply, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.tenant_id)
        .bind(&record.visitor_id)
        .bind(&record.message)
        .bind(&record.reply)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(
        &self,
        tenant_id: &str,
        visitor_id: &str,
    ) -> Result<Vec<ChatRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT tenant_id, visitor_id, message, reply, created_at FROM chats \
             WHERE tenant_id = ?1 AND visitor_id = ?2 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(tenant_id)
        .bind(visitor_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(ChatRecord {
                tenant_id: row.try_get("tenant_id")?,
                visitor_id: row.try_get("visitor_id")?,
                message: row.try_get("message")?,
                reply: row.try_get("reply")?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            });
        }
        Ok(out)
    }

    async fn record_question(&self, tenant_id: &str, question: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO analytics (tenant_id, conversation_count) VALUES (?1, 1) \
             ON CONFLICT(tenant_id) DO UPDATE SET conversation_count = conversation_count + 1",
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO question_stats (tenant_id, question, count) VALUES (?1, ?2, 1) \
             ON CONFLICT(tenant_id, question) DO UPDATE SET count = count + 1",
        )
        .bind(tenant_id)
        .bind(question)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn analytics(&self, tenant_id: &str) -> Result<AnalyticsSnapshot, StoreError> {
        let conversation_count: i64 =
            sqlx::query_scalar("SELECT conversation_count FROM analytics WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?
                .unwrap_or(0);

        let rows = sqlx::query(
            "SELECT question, count FROM question_stats \
             WHERE tenant_id = ?1 ORDER BY count DESC, question ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut common_questions = Vec::with_capacity(rows.len());
        for row in rows {
            common_questions.push((row.try_get("question")?, row.try_get("count")?));
        }

        Ok(AnalyticsSnapshot {
            conversation_count,
            common_questions,
        })
    }
}
