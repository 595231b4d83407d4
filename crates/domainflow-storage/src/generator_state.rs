use crate::models::GeneratorConfigState;
use chrono::Utc;
use domainflow_core::Result;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;

pub struct GeneratorConfigStateRepository {
    pool: SqlitePool,
}

impl GeneratorConfigStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GeneratorConfigStateRepository { pool }
    }

    /// Look up the shared offset for a generation config, creating a
    /// fresh zero-offset row the first time this config hash is seen.
    /// Lets two campaigns with an identical config (§4.2) observe each
    /// other's progress.
    pub async fn get_or_create(&self, config_hash: &str, config_details: &Value) -> Result<i64> {
        if let Some(existing) = self.get(config_hash).await? {
            return Ok(existing.last_offset);
        }
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO generator_config_state (config_hash, last_offset, config_details, updated_at)
             VALUES (?, 0, ?, ?)
             ON CONFLICT (config_hash) DO NOTHING",
        )
        .bind(config_hash)
        .bind(Json(config_details))
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(self.get(config_hash).await?.map(|s| s.last_offset).unwrap_or(0))
    }

    pub async fn get(&self, config_hash: &str) -> Result<Option<GeneratorConfigState>> {
        sqlx::query_as::<_, GeneratorConfigState>(
            "SELECT * FROM generator_config_state WHERE config_hash = ?",
        )
        .bind(config_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Advance the shared offset under a row lock; contention (two
    /// campaigns racing the same config) is resolved by the loser
    /// re-reading the new offset and retrying from there (§4.2).
    pub async fn advance(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        config_hash: &str,
        expected_current: i64,
        new_offset: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE generator_config_state SET last_offset = ?, updated_at = ?
             WHERE config_hash = ? AND last_offset = ?",
        )
        .bind(new_offset)
        .bind(Utc::now())
        .bind(config_hash)
        .bind(expected_current)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
