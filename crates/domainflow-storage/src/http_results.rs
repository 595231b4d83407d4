use crate::models::HttpKeywordResult;
use chrono::Utc;
use domainflow_core::{Cursor, HttpValidationStatus, Page, Result};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewHttpKeywordResult {
    pub http_campaign_id: Uuid,
    pub dns_result_id: Option<Uuid>,
    pub domain_name: String,
    pub validation_status: HttpValidationStatus,
    pub http_status: Option<i64>,
    pub response_headers: serde_json::Value,
    pub page_title: Option<String>,
    pub extracted_snippet: Option<String>,
    pub found_keywords_from_sets: Vec<String>,
    pub found_ad_hoc_keywords: Vec<String>,
    pub content_hash: Option<String>,
    pub persona_id: Option<Uuid>,
    pub proxy_id: Option<Uuid>,
    pub attempts: i64,
}

pub struct HttpKeywordResultRepository {
    pool: SqlitePool,
}

impl HttpKeywordResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HttpKeywordResultRepository { pool }
    }

    pub async fn insert_batch(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        results: &[NewHttpKeywordResult],
    ) -> Result<()> {
        let now = Utc::now();
        for r in results {
            sqlx::query(
                "INSERT INTO http_keyword_results
                    (id, http_campaign_id, dns_result_id, domain_name, validation_status,
                     http_status, response_headers, page_title, extracted_snippet,
                     found_keywords_from_sets, found_ad_hoc_keywords, content_hash,
                     persona_id, proxy_id, attempts, last_checked, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(r.http_campaign_id)
            .bind(r.dns_result_id)
            .bind(&r.domain_name)
            .bind(r.validation_status)
            .bind(r.http_status)
            .bind(Json(&r.response_headers))
            .bind(&r.page_title)
            .bind(&r.extracted_snippet)
            .bind(Json(&r.found_keywords_from_sets))
            .bind(Json(&r.found_ad_hoc_keywords))
            .bind(&r.content_hash)
            .bind(r.persona_id)
            .bind(r.proxy_id)
            .bind(r.attempts)
            .bind(now)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn page(
        &self,
        http_campaign_id: Uuid,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Page<HttpKeywordResult>> {
        let mut rows = if let Some(c) = cursor {
            sqlx::query_as::<_, HttpKeywordResult>(
                "SELECT * FROM http_keyword_results
                 WHERE http_campaign_id = ? AND (created_at, id) > (?, ?)
                 ORDER BY created_at, id LIMIT ?",
            )
            .bind(http_campaign_id)
            .bind(c.created_at)
            .bind(c.id)
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, HttpKeywordResult>(
                "SELECT * FROM http_keyword_results WHERE http_campaign_id = ?
                 ORDER BY created_at, id LIMIT ?",
            )
            .bind(http_campaign_id)
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
}
