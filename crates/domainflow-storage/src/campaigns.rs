use crate::models::Campaign;
use chrono::Utc;
use domainflow_core::{CampaignStatus, CampaignType, Cursor, Page, Result};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub campaign_type: CampaignType,
    pub owner_user_id: Uuid,
    pub metadata: Value,
}

#[derive(Debug, Clone, Default)]
pub struct CampaignFilters {
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
    pub owner_user_id: Option<Uuid>,
}

pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CampaignRepository { pool }
    }

    pub async fn create(&self, new: NewCampaign) -> Result<Campaign> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO campaigns
                (id, name, campaign_type, status, owner_user_id, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&new.name)
        .bind(new.campaign_type)
        .bind(CampaignStatus::Pending)
        .bind(new.owner_user_id)
        .bind(Json(&new.metadata))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Campaign> {
        sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| domainflow_core::Error::not_found(format!("campaign {id} not found")))
    }

    pub async fn list(
        &self,
        filters: &CampaignFilters,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Page<Campaign>> {
        // Built with a small number of statically-known shapes rather than
        // a query builder: the filter set is fixed by §6, not open-ended.
        let mut sql = String::from("SELECT * FROM campaigns WHERE deleted_at IS NULL");
        if filters.campaign_type.is_some() {
            sql.push_str(" AND campaign_type = ?");
        }
        if filters.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filters.owner_user_id.is_some() {
            sql.push_str(" AND owner_user_id = ?");
        }
        if cursor.is_some() {
            sql.push_str(" AND (created_at, id) > (?, ?)");
        }
        sql.push_str(" ORDER BY created_at, id LIMIT ?");

        let mut query = sqlx::query_as::<_, Campaign>(&sql);
        if let Some(t) = filters.campaign_type {
            query = query.bind(t);
        }
        if let Some(s) = filters.status {
            query = query.bind(s);
        }
        if let Some(owner) = filters.owner_user_id {
            query = query.bind(owner);
        }
        if let Some(c) = cursor {
            query = query.bind(c.created_at).bind(c.id);
        }
        // fetch one extra row to know whether another page follows
        let mut rows = query.bind(limit + 1).fetch_all(&self.pool).await?;

        let next_cursor = if rows.len() as i64 > limit {
            rows.truncate(limit as usize);
            rows.last().map(|c| Cursor { created_at: c.created_at, id: c.id })
        } else {
            None
        };

        Ok(Page::new(rows, next_cursor))
    }

    /// Transition the campaign's status, persisting atomically with the
    /// triggering event (§4.9). Callers are expected to have already
    /// validated the edge is legal; this just writes it.
    pub async fn transition_status(
        &self,
        id: Uuid,
        status: CampaignStatus,
        error_message: Option<&str>,
    ) -> Result<Campaign> {
        let now = Utc::now();
        let started_at = matches!(status, CampaignStatus::Running).then_some(now);
        let completed_at = status.is_terminal().then_some(now);

        sqlx::query(
            "UPDATE campaigns SET
                status = ?,
                last_error = COALESCE(?, last_error),
                started_at = COALESCE(started_at, ?),
                completed_at = COALESCE(?, completed_at),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(status)
        .bind(error_message)
        .bind(started_at)
        .bind(completed_at)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Increment the aggregate counters for a batch of results. Must be
    /// called from inside the same transaction that persisted the result
    /// rows; see `domainflow-storage::tx` for the row-locked transaction
    /// helper this is paired with.
    pub async fn increment_counters(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: Uuid,
        processed: i64,
        successful: i64,
        failed: i64,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE campaigns SET
                processed_items = processed_items + ?,
                successful_items = successful_items + ?,
                failed_items = failed_items + ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(processed)
        .bind(successful)
        .bind(failed)
        .bind(now)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn set_total_items(&self, id: Uuid, total: i64) -> Result<()> {
        sqlx::query("UPDATE campaigns SET total_items = ?, updated_at = ? WHERE id = ?")
            .bind(total)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminal-only soft delete; cascades are handled by `ON DELETE
    /// CASCADE` foreign keys once the row is hard-deleted by a background
    /// reaper, but the user-visible delete is a tombstone.
    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let campaign = self.get(id).await?;
        if !campaign.status.is_terminal() {
            return Err(domainflow_core::Error::conflict(
                "campaign must be in a terminal state before it can be deleted",
            ));
        }
        sqlx::query("UPDATE campaigns SET deleted_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
