use crate::models::DnsResult;
use chrono::Utc;
use domainflow_core::{Cursor, DnsValidationStatus, Page, Result};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewDnsResult {
    pub dns_campaign_id: Uuid,
    pub generated_domain_id: Option<Uuid>,
    pub domain_name: String,
    pub validation_status: DnsValidationStatus,
    pub dns_records: Value,
    pub validating_persona_id: Option<Uuid>,
    pub attempt_count: i64,
}

pub struct DnsResultRepository {
    pool: SqlitePool,
}

impl DnsResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DnsResultRepository { pool }
    }

    pub async fn insert_batch(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        results: &[NewDnsResult],
    ) -> Result<()> {
        let now = Utc::now();
        for r in results {
            sqlx::query(
                "INSERT INTO dns_results
                    (id, dns_campaign_id, generated_domain_id, domain_name, validation_status,
                     dns_records, validating_persona_id, attempt_count, last_checked, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(r.dns_campaign_id)
            .bind(r.generated_domain_id)
            .bind(&r.domain_name)
            .bind(r.validation_status)
            .bind(Json(&r.dns_records))
            .bind(r.validating_persona_id)
            .bind(r.attempt_count)
            .bind(now)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn page(
        &self,
        dns_campaign_id: Uuid,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Page<DnsResult>> {
        let mut rows = if let Some(c) = cursor {
            sqlx::query_as::<_, DnsResult>(
                "SELECT * FROM dns_results
                 WHERE dns_campaign_id = ? AND (created_at, id) > (?, ?)
                 ORDER BY created_at, id LIMIT ?",
            )
            .bind(dns_campaign_id)
            .bind(c.created_at)
            .bind(c.id)
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, DnsResult>(
                "SELECT * FROM dns_results WHERE dns_campaign_id = ? ORDER BY created_at, id LIMIT ?",
            )
            .bind(dns_campaign_id)
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?
        };

        let next_cursor = if rows.len() as i64 > limit {
            rows.truncate(limit as usize);
            rows.last().map(|r| Cursor { created_at: r.created_at, id: r.id })
        } else {
            None
        };
        Ok(Page::new(rows, next_cursor))
    }

    /// Next `batch_size` resolved DNS results for `dns_campaign_id` not yet
    /// present in `http_campaign_id`'s results — drives §4.8 step 2 when
    /// `source_type = DnsValidation`.
    pub async fn next_resolved_batch(
        &self,
        dns_campaign_id: Uuid,
        http_campaign_id: Uuid,
        batch_size: i64,
    ) -> Result<Vec<DnsResult>> {
        sqlx::query_as::<_, DnsResult>(
            "SELECT dr.* FROM dns_results dr
             LEFT JOIN http_keyword_results hr
               ON hr.http_campaign_id = ? AND hr.domain_name = dr.domain_name
             WHERE dr.dns_campaign_id = ? AND dr.validation_status = 'resolved' AND hr.id IS NULL
             ORDER BY dr.created_at, dr.id
             LIMIT ?",
        )
        .bind(http_campaign_id)
        .bind(dns_campaign_id)
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn remaining_resolved_count(
        &self,
        dns_campaign_id: Uuid,
        http_campaign_id: Uuid,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM dns_results dr
             LEFT JOIN http_keyword_results hr
               ON hr.http_campaign_id = ? AND hr.domain_name = dr.domain_name
             WHERE dr.dns_campaign_id = ? AND dr.validation_status = 'resolved' AND hr.id IS NULL",
        )
        .bind(http_campaign_id)
        .bind(dns_campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
