use chrono::{DateTime, Utc};
use domainflow_core::{
    CampaignStatus, CampaignType, DnsValidationStatus, HttpValidationStatus, JobStatus,
    PatternType, PersonaType, ProxyProtocol, ProxySelectionStrategy, SourceType,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub owner_user_id: Uuid,
    pub total_items: i64,
    pub processed_items: i64,
    pub successful_items: i64,
    pub failed_items: i64,
    pub metadata: Json<serde_json::Value>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// `progress = processed / max(total, 1)`, per the §3 invariant.
    pub fn progress(&self) -> f64 {
        self.processed_items as f64 / self.total_items.max(1) as f64
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GenerationPhaseParams {
    pub campaign_id: Uuid,
    pub pattern_type: PatternType,
    pub variable_length: i64,
    pub character_set: String,
    pub constant_string: String,
    pub tld: String,
    pub num_domains_to_generate: i64,
    pub total_possible_combinations: i64,
    pub current_offset: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DnsValidationPhaseParams {
    pub campaign_id: Uuid,
    pub source_generation_campaign_id: Uuid,
    /// JSON array of persona ids, stored as TEXT (SQLite has no array type).
    pub persona_ids: Json<Vec<Uuid>>,
    pub rotation_interval_seconds: i64,
    pub processing_speed_per_minute: i64,
    pub batch_size: i64,
    pub retry_attempts: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct HttpKeywordPhaseParams {
    pub campaign_id: Uuid,
    pub source_campaign_id: Uuid,
    pub source_type: SourceType,
    pub persona_ids: Json<Vec<Uuid>>,
    pub keyword_set_ids: Json<Vec<Uuid>>,
    pub ad_hoc_keywords: Json<Vec<String>>,
    pub proxy_ids: Option<Json<Vec<Uuid>>>,
    pub proxy_pool_id: Option<Uuid>,
    pub proxy_selection_strategy: ProxySelectionStrategy,
    pub batch_size: i64,
    pub retry_attempts: i64,
    pub target_http_ports: Json<Vec<i64>>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GeneratedDomain {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub domain_name: String,
    pub offset_index: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DnsResult {
    pub id: Uuid,
    pub dns_campaign_id: Uuid,
    pub generated_domain_id: Option<Uuid>,
    pub domain_name: String,
    pub validation_status: DnsValidationStatus,
    pub dns_records: Json<serde_json::Value>,
    pub validating_persona_id: Option<Uuid>,
    pub attempt_count: i64,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct HttpKeywordResult {
    pub id: Uuid,
    pub http_campaign_id: Uuid,
    pub dns_result_id: Option<Uuid>,
    pub domain_name: String,
    pub validation_status: HttpValidationStatus,
    pub http_status: Option<i64>,
    pub response_headers: Json<serde_json::Value>,
    pub page_title: Option<String>,
    pub extracted_snippet: Option<String>,
    pub found_keywords_from_sets: Json<Vec<String>>,
    pub found_ad_hoc_keywords: Json<Vec<String>>,
    pub content_hash: Option<String>,
    pub persona_id: Option<Uuid>,
    pub proxy_id: Option<Uuid>,
    pub attempts: i64,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub persona_type: PersonaType,
    pub config_details: Json<serde_json::Value>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Proxy {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub protocol: ProxyProtocol,
    pub credentials_hash: Option<String>,
    pub enabled: bool,
    pub healthy: bool,
    pub last_status: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub latency_ms: Option<i64>,
    pub failure_streak: i64,
    pub geo_metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proxy {
    /// Eligible for selection iff enabled and healthy (§3 invariant).
    pub fn is_eligible(&self) -> bool {
        self.enabled && self.healthy
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProxyPool {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub pattern: String,
    pub rule_type: domainflow_core::RuleType,
    pub case_sensitive: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct KeywordSet {
    pub id: Uuid,
    pub name: String,
    /// Nullable list of rules, per the Open Question decision in §9: model
    /// as `Option<Vec<_>>`, not an empty vec, so "no rules configured" is
    /// distinguishable from "rules column present but empty".
    pub rules: Option<Json<Vec<KeywordRule>>>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub job_type: CampaignType,
    pub status: JobStatus,
    pub scheduled_at: DateTime<Utc>,
    pub next_execution_at: DateTime<Utc>,
    pub attempts: i64,
    pub max_attempts: i64,
    pub last_attempted_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub processing_server_id: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub payload: Json<serde_json::Value>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GeneratorConfigState {
    pub config_hash: String,
    pub last_offset: i64,
    pub config_details: Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Json<serde_json::Value>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}
