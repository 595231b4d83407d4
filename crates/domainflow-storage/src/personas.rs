use crate::models::Persona;
use chrono::Utc;
use domainflow_core::{PersonaType, Result};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct PersonaRepository {
    pool: SqlitePool,
}

impl PersonaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PersonaRepository { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        persona_type: PersonaType,
        config_details: Value,
    ) -> Result<Persona> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO personas (id, name, persona_type, config_details, enabled, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(persona_type)
        .bind(Json(&config_details))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Persona> {
        sqlx::query_as::<_, Persona>("SELECT * FROM personas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| domainflow_core::Error::not_found(format!("persona {id} not found")))
    }

    /// Enabled personas of `persona_type`, ordered by display name (§4.3).
    pub async fn get_active(&self, persona_type: PersonaType) -> Result<Vec<Persona>> {
        sqlx::query_as::<_, Persona>(
            "SELECT * FROM personas WHERE persona_type = ? AND enabled = 1 ORDER BY name",
        )
        .bind(persona_type)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE personas SET enabled = ?, updated_at = ? WHERE id = ?")
            .bind(enabled)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM personas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
