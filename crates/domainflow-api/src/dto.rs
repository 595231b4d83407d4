//! Wire DTOs for the `/campaigns`, `/personas`, `/proxies`, and
//! `/keyword-sets` routes (§6). Kept separate from the orchestrator's own
//! `Create*Request` structs since the wire shape is camelCase JSON, not a
//! Rust-idiomatic call site.

use domainflow_core::{
    CampaignStatus, CampaignType, PatternType, ProxyProtocol, ProxySelectionStrategy, RuleType,
    SourceType,
};
use domainflow_orchestrator::requests::{
    CreateCampaignRequest, CreateDnsValidationRequest, CreateGenerationRequest,
    CreateHttpKeywordRequest,
};
use domainflow_storage::models::{Campaign, KeywordRule, KeywordSet, Persona, Proxy, ProxyPool};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreateCampaignBody {
    Generation(GenerationBody),
    DnsValidation(DnsValidationBody),
    HttpKeyword(HttpKeywordBody),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationBody {
    pub name: String,
    pub pattern_type: PatternType,
    pub variable_length: i64,
    pub character_set: String,
    pub constant_string: String,
    pub tld: String,
    pub num_domains_to_generate: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsValidationBody {
    pub name: String,
    pub source_generation_campaign_id: Uuid,
    pub persona_ids: Vec<Uuid>,
    pub rotation_interval_seconds: i64,
    pub processing_speed_per_minute: i64,
    pub batch_size: i64,
    pub retry_attempts: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpKeywordBody {
    pub name: String,
    pub source_campaign_id: Uuid,
    pub source_type: SourceType,
    pub persona_ids: Vec<Uuid>,
    #[serde(default)]
    pub keyword_set_ids: Vec<Uuid>,
    #[serde(default)]
    pub ad_hoc_keywords: Vec<String>,
    #[serde(default)]
    pub proxy_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub proxy_pool_id: Option<Uuid>,
    pub proxy_selection_strategy: ProxySelectionStrategy,
    pub batch_size: i64,
    pub retry_attempts: i64,
    pub target_http_ports: Vec<i64>,
}

impl CreateCampaignBody {
    /// Attaches the requesting user as the campaign owner and converts to
    /// the orchestrator's own request type. Ownership is the one
    /// authorization check this core performs (§1 Non-goals); everything
    /// upstream of "who is the caller" is the auth collaborator's job.
    pub fn into_request(self, owner_user_id: Uuid) -> CreateCampaignRequest {
        match self {
            CreateCampaignBody::Generation(b) => CreateCampaignRequest::Generation(CreateGenerationRequest {
                name: b.name,
                owner_user_id,
                pattern_type: b.pattern_type,
                variable_length: b.variable_length,
                character_set: b.character_set,
                constant_string: b.constant_string,
                tld: b.tld,
                num_domains_to_generate: b.num_domains_to_generate,
            }),
            CreateCampaignBody::DnsValidation(b) => {
                CreateCampaignRequest::DnsValidation(CreateDnsValidationRequest {
                    name: b.name,
                    owner_user_id,
                    source_generation_campaign_id: b.source_generation_campaign_id,
                    persona_ids: b.persona_ids,
                    rotation_interval_seconds: b.rotation_interval_seconds,
                    processing_speed_per_minute: b.processing_speed_per_minute,
                    batch_size: b.batch_size,
                    retry_attempts: b.retry_attempts,
                })
            }
            CreateCampaignBody::HttpKeyword(b) => {
                CreateCampaignRequest::HttpKeyword(CreateHttpKeywordRequest {
                    name: b.name,
                    owner_user_id,
                    source_campaign_id: b.source_campaign_id,
                    source_type: b.source_type,
                    persona_ids: b.persona_ids,
                    keyword_set_ids: b.keyword_set_ids,
                    ad_hoc_keywords: b.ad_hoc_keywords,
                    proxy_ids: b.proxy_ids,
                    proxy_pool_id: b.proxy_pool_id,
                    proxy_selection_strategy: b.proxy_selection_strategy,
                    batch_size: b.batch_size,
                    retry_attempts: b.retry_attempts,
                    target_http_ports: b.target_http_ports,
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCampaignsQuery {
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
    pub cursor: Option<String>,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub cursor: Option<String>,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

pub fn default_page_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct PageBody<T: Serialize> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T: Serialize> PageBody<T> {
    pub fn from_page(page: domainflow_core::Page<T>) -> Self {
        PageBody { items: page.items, next_cursor: page.next_cursor.map(|c| c.encode()) }
    }
}

/// Campaign response: re-serializes the storage model directly. Every
/// field on `Campaign` is already caller-visible (§3), so no separate
/// projection is needed.
pub type CampaignResponse = Campaign;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonaBody {
    pub name: String,
    pub persona_type: domainflow_core::PersonaType,
    pub config_details: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledBody {
    pub enabled: bool,
}

pub type PersonaResponse = Persona;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProxyBody {
    pub name: String,
    pub address: String,
    pub protocol: ProxyProtocol,
    #[serde(default)]
    pub credentials: Option<String>,
}

/// Proxies never echo back `credentials_hash`, even though it is already
/// a hash and not the plaintext credential (§3's "never return plaintext
/// even in admin views" applies to the stored secret material itself).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub protocol: ProxyProtocol,
    pub enabled: bool,
    pub healthy: bool,
    pub last_status: Option<String>,
    pub last_checked: Option<chrono::DateTime<chrono::Utc>>,
    pub latency_ms: Option<i64>,
    pub failure_streak: i64,
}

impl From<Proxy> for ProxyResponse {
    fn from(p: Proxy) -> Self {
        ProxyResponse {
            id: p.id,
            name: p.name,
            address: p.address,
            protocol: p.protocol,
            enabled: p.enabled,
            healthy: p.healthy,
            last_status: p.last_status,
            last_checked: p.last_checked,
            latency_ms: p.latency_ms,
            failure_streak: p.failure_streak,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProxyPoolBody {
    pub name: String,
}

pub type ProxyPoolResponse = ProxyPool;

#[derive(Debug, Deserialize)]
pub struct PoolMembershipBody {
    pub proxy_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeywordSetBody {
    pub name: String,
    #[serde(default)]
    pub rules: Option<Vec<KeywordRuleBody>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRuleBody {
    pub pattern: String,
    pub rule_type: RuleType,
    pub case_sensitive: bool,
    pub weight: f64,
}

impl From<KeywordRuleBody> for KeywordRule {
    fn from(b: KeywordRuleBody) -> Self {
        KeywordRule { pattern: b.pattern, rule_type: b.rule_type, case_sensitive: b.case_sensitive, weight: b.weight }
    }
}

pub type KeywordSetResponse = KeywordSet;
