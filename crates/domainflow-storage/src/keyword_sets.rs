use crate::models::{KeywordRule, KeywordSet};
use chrono::Utc;
use domainflow_core::Result;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct KeywordSetRepository {
    pool: SqlitePool,
}

impl KeywordSetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KeywordSetRepository { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        rules: Option<Vec<KeywordRule>>,
    ) -> Result<KeywordSet> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO keyword_sets (id, name, rules, enabled, created_at, updated_at)
             VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(rules.as_ref().map(Json))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<KeywordSet> {
        sqlx::query_as::<_, KeywordSet>("SELECT * FROM keyword_sets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| domainflow_core::Error::not_found(format!("keyword set {id} not found")))
    }

    pub async fn list(&self) -> Result<Vec<KeywordSet>> {
        sqlx::query_as::<_, KeywordSet>("SELECT * FROM keyword_sets ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<KeywordSet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql =
            format!("SELECT * FROM keyword_sets WHERE enabled = 1 AND id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, KeywordSet>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.fetch_all(&self.pool).await.map_err(Into::into)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM keyword_sets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
