use chrono::Utc;
use domainflow_core::Result;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct AuditLogRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Value,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Append-only: there is no update/delete on this table by design.
    pub async fn record(&self, entry: NewAuditLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO audit_log
                (id, occurred_at, user_id, action, entity_type, entity_id, details,
                 client_ip, user_agent)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(Json(&entry.details))
        .bind(&entry.client_ip)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
