use crate::models::{DnsValidationPhaseParams, GenerationPhaseParams, HttpKeywordPhaseParams};
use domainflow_core::Result;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct PhaseParamsRepository {
    pool: SqlitePool,
}

impl PhaseParamsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PhaseParamsRepository { pool }
    }

    pub async fn insert_generation(&self, params: &GenerationPhaseParams) -> Result<()> {
        sqlx::query(
            "INSERT INTO generation_phase_params
                (campaign_id, pattern_type, variable_length, character_set, constant_string,
                 tld, num_domains_to_generate, total_possible_combinations, current_offset)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.campaign_id)
        .bind(params.pattern_type)
        .bind(params.variable_length)
        .bind(&params.character_set)
        .bind(&params.constant_string)
        .bind(&params.tld)
        .bind(params.num_domains_to_generate)
        .bind(params.total_possible_combinations)
        .bind(params.current_offset)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_generation(&self, campaign_id: Uuid) -> Result<GenerationPhaseParams> {
        sqlx::query_as::<_, GenerationPhaseParams>(
            "SELECT * FROM generation_phase_params WHERE campaign_id = ?",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            domainflow_core::Error::not_found(format!(
                "generation phase params for campaign {campaign_id} not found"
            ))
        })
    }

    /// Advance `current_offset` as part of the same transaction that
    /// persists the newly emitted domains (§4.2). Returns the prior
    /// offset so the caller can assert the emitted range matched it.
    pub async fn advance_offset(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        campaign_id: Uuid,
        new_offset: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE generation_phase_params SET current_offset = ? WHERE campaign_id = ?")
            .bind(new_offset)
            .bind(campaign_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert_dns_validation(&self, params: &DnsValidationPhaseParams) -> Result<()> {
        sqlx::query(
            "INSERT INTO dns_validation_phase_params
                (campaign_id, source_generation_campaign_id, persona_ids,
                 rotation_interval_seconds, processing_speed_per_minute, batch_size,
                 retry_attempts)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.campaign_id)
        .bind(params.source_generation_campaign_id)
        .bind(&params.persona_ids)
        .bind(params.rotation_interval_seconds)
        .bind(params.processing_speed_per_minute)
        .bind(params.batch_size)
        .bind(params.retry_attempts)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_dns_validation(&self, campaign_id: Uuid) -> Result<DnsValidationPhaseParams> {
        sqlx::query_as::<_, DnsValidationPhaseParams>(
            "SELECT * FROM dns_validation_phase_params WHERE campaign_id = ?",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            domainflow_core::Error::not_found(format!(
                "dns validation phase params for campaign {campaign_id} not found"
            ))
        })
    }

    pub async fn insert_http_keyword(&self, params: &HttpKeywordPhaseParams) -> Result<()> {
        sqlx::query(
            "INSERT INTO http_keyword_phase_params
                (campaign_id, source_campaign_id, source_type, persona_ids, keyword_set_ids,
                 ad_hoc_keywords, proxy_ids, proxy_pool_id, proxy_selection_strategy,
                 batch_size, retry_attempts, target_http_ports)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.campaign_id)
        .bind(params.source_campaign_id)
        .bind(params.source_type)
        .bind(&params.persona_ids)
        .bind(&params.keyword_set_ids)
        .bind(&params.ad_hoc_keywords)
        .bind(params.proxy_ids.as_ref().map(|j| Json(j.0.clone())))
        .bind(params.proxy_pool_id)
        .bind(params.proxy_selection_strategy)
        .bind(params.batch_size)
        .bind(params.retry_attempts)
        .bind(&params.target_http_ports)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_http_keyword(&self, campaign_id: Uuid) -> Result<HttpKeywordPhaseParams> {
        sqlx::query_as::<_, HttpKeywordPhaseParams>(
            "SELECT * FROM http_keyword_phase_params WHERE campaign_id = ?",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            domainflow_core::Error::not_found(format!(
                "http keyword phase params for campaign {campaign_id} not found"
            ))
        })
    }
}
