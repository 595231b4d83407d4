use crate::models::GeneratedDomain;
use chrono::Utc;
use domainflow_core::{Cursor, Page, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct GeneratedDomainRepository {
    pool: SqlitePool,
}

impl GeneratedDomainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GeneratedDomainRepository { pool }
    }

    /// Insert a contiguous batch of freshly generated domains inside the
    /// same transaction that advances `current_offset` (§4.2). `offsets`
    /// and `domain_names` are parallel and must be the same length.
    pub async fn insert_batch(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        campaign_id: Uuid,
        domain_names: &[String],
        offsets: &[i64],
    ) -> Result<()> {
        debug_assert_eq!(domain_names.len(), offsets.len());
        let now = Utc::now();
        for (name, offset) in domain_names.iter().zip(offsets) {
            sqlx::query(
                "INSERT INTO generated_domains (id, campaign_id, domain_name, offset_index, created_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(campaign_id)
            .bind(name)
            .bind(offset)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn page(
        &self,
        campaign_id: Uuid,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Page<GeneratedDomain>> {
        let mut rows = if let Some(c) = cursor {
            sqlx::query_as::<_, GeneratedDomain>(
                "SELECT * FROM generated_domains
                 WHERE campaign_id = ? AND (created_at, id) > (?, ?)
                 ORDER BY created_at, id LIMIT ?",
            )
            .bind(campaign_id)
            .bind(c.created_at)
            .bind(c.id)
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, GeneratedDomain>(
                "SELECT * FROM generated_domains WHERE campaign_id = ? ORDER BY created_at, id LIMIT ?",
            )
            .bind(campaign_id)
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?
        };

        let next_cursor = if rows.len() as i64 > limit {
            rows.truncate(limit as usize);
            rows.last().map(|d| Cursor { created_at: d.created_at, id: d.id })
        } else {
            None
        };
        Ok(Page::new(rows, next_cursor))
    }

    /// Next `batch_size` generated domains for `campaign_id` not yet
    /// present in `dns_results` for `dns_campaign_id` — the left-anti-join
    /// driving the DNS Validator's batch pull (§4.7 step 2).
    pub async fn next_unvalidated_batch(
        &self,
        generation_campaign_id: Uuid,
        dns_campaign_id: Uuid,
        batch_size: i64,
    ) -> Result<Vec<GeneratedDomain>> {
        sqlx::query_as::<_, GeneratedDomain>(
            "SELECT gd.* FROM generated_domains gd
             LEFT JOIN dns_results dr
               ON dr.dns_campaign_id = ? AND dr.domain_name = gd.domain_name
             WHERE gd.campaign_id = ? AND dr.id IS NULL
             ORDER BY gd.offset_index
             LIMIT ?",
        )
        .bind(dns_campaign_id)
        .bind(generation_campaign_id)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn remaining_count(
        &self,
        generation_campaign_id: Uuid,
        dns_campaign_id: Uuid,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM generated_domains gd
             LEFT JOIN dns_results dr
               ON dr.dns_campaign_id = ? AND dr.domain_name = gd.domain_name
             WHERE gd.campaign_id = ? AND dr.id IS NULL",
        )
        .bind(dns_campaign_id)
        .bind(generation_campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Next `batch_size` generated domains not yet present in
    /// `http_campaign_id`'s results — drives §4.8 step 2 when
    /// `source_type = DomainGeneration` (no DNS hop in between).
    pub async fn next_unprocessed_batch_for_http(
        &self,
        generation_campaign_id: Uuid,
        http_campaign_id: Uuid,
        batch_size: i64,
    ) -> Result<Vec<GeneratedDomain>> {
        sqlx::query_as::<_, GeneratedDomain>(
            "SELECT gd.* FROM generated_domains gd
             LEFT JOIN http_keyword_results hr
               ON hr.http_campaign_id = ? AND hr.domain_name = gd.domain_name
             WHERE gd.campaign_id = ? AND hr.id IS NULL
             ORDER BY gd.offset_index
             LIMIT ?",
        )
        .bind(http_campaign_id)
        .bind(generation_campaign_id)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
