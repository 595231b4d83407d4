use domainflow_core::{PatternType, ProxySelectionStrategy, SourceType};
use uuid::Uuid;

/// Inputs for `create(type=generation, ...)` (§4.2, §4.9). Distinct from
/// [`domainflow_storage::models::GenerationPhaseParams`]: the computed
/// fields (`total_possible_combinations`, `current_offset`) aren't caller
/// input, they're derived during validation.
#[derive(Debug, Clone)]
pub struct CreateGenerationRequest {
    pub name: String,
    pub owner_user_id: Uuid,
    pub pattern_type: PatternType,
    pub variable_length: i64,
    pub character_set: String,
    pub constant_string: String,
    pub tld: String,
    pub num_domains_to_generate: i64,
}

#[derive(Debug, Clone)]
pub struct CreateDnsValidationRequest {
    pub name: String,
    pub owner_user_id: Uuid,
    pub source_generation_campaign_id: Uuid,
    pub persona_ids: Vec<Uuid>,
    pub rotation_interval_seconds: i64,
    pub processing_speed_per_minute: i64,
    pub batch_size: i64,
    pub retry_attempts: i64,
}

#[derive(Debug, Clone)]
pub struct CreateHttpKeywordRequest {
    pub name: String,
    pub owner_user_id: Uuid,
    pub source_campaign_id: Uuid,
    pub source_type: SourceType,
    pub persona_ids: Vec<Uuid>,
    pub keyword_set_ids: Vec<Uuid>,
    pub ad_hoc_keywords: Vec<String>,
    pub proxy_ids: Option<Vec<Uuid>>,
    pub proxy_pool_id: Option<Uuid>,
    pub proxy_selection_strategy: ProxySelectionStrategy,
    pub batch_size: i64,
    pub retry_attempts: i64,
    pub target_http_ports: Vec<i64>,
}

/// The single canonical entry point for campaign creation (§4.9, Open
/// Question 3): the caller picks the variant, there is no separate
/// alias per campaign type.
#[derive(Debug, Clone)]
pub enum CreateCampaignRequest {
    Generation(CreateGenerationRequest),
    DnsValidation(CreateDnsValidationRequest),
    HttpKeyword(CreateHttpKeywordRequest),
}
