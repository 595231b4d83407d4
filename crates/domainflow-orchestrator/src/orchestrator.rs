use crate::requests::{CreateCampaignRequest, CreateDnsValidationRequest, CreateGenerationRequest, CreateHttpKeywordRequest};
use crate::state_machine::is_legal_transition;
use crate::validation::{validate_dns_validation, validate_generation, validate_http_keyword};
use domainflow_core::{CampaignStatus, CampaignType, Cursor, Error, Page, Result};
use domainflow_queue::JobQueue;
use domainflow_storage::audit::NewAuditLogEntry;
use domainflow_storage::campaigns::NewCampaign;
use domainflow_storage::models::{Campaign, DnsResult, GeneratedDomain, HttpKeywordResult};
use domainflow_storage::Store;
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

/// One page of a campaign's results, typed by the campaign's own type
/// since each phase writes to a different results table (§4.9
/// `get_results`, delegated straight to the Store).
pub enum CampaignResults {
    Generation(Page<GeneratedDomain>),
    DnsValidation(Page<DnsResult>),
    HttpKeyword(Page<HttpKeywordResult>),
}

/// The campaign control surface (§4.9): validated creation, the lifecycle
/// state machine, and results retrieval. Holds the Store and Job Queue
/// directly rather than going through the Worker Pool, since none of
/// these operations dispatch to a handler themselves.
pub struct Orchestrator {
    store: Arc<Store>,
    queue: Arc<JobQueue>,
}

impl Orchestrator {
    pub fn new(store: Arc<Store>, queue: Arc<JobQueue>) -> Self {
        Orchestrator { store, queue }
    }

    pub async fn create(&self, request: CreateCampaignRequest) -> Result<Campaign> {
        match request {
            CreateCampaignRequest::Generation(req) => self.create_generation(req).await,
            CreateCampaignRequest::DnsValidation(req) => self.create_dns_validation(req).await,
            CreateCampaignRequest::HttpKeyword(req) => self.create_http_keyword(req).await,
        }
    }

    async fn create_generation(&self, request: CreateGenerationRequest) -> Result<Campaign> {
        let validated = validate_generation(request)?;
        let req = validated.request;
        let campaign = self
            .store
            .campaigns
            .create(NewCampaign {
                name: req.name.clone(),
                campaign_type: CampaignType::Generation,
                owner_user_id: req.owner_user_id,
                metadata: serde_json::json!({}),
            })
            .await?;

        self.store
            .phase_params
            .insert_generation(&domainflow_storage::models::GenerationPhaseParams {
                campaign_id: campaign.id,
                pattern_type: req.pattern_type,
                variable_length: req.variable_length,
                character_set: req.character_set,
                constant_string: req.constant_string,
                tld: req.tld,
                num_domains_to_generate: req.num_domains_to_generate,
                total_possible_combinations: validated.total_possible_combinations,
                current_offset: 0,
            })
            .await?;
        self.store.campaigns.set_total_items(campaign.id, req.num_domains_to_generate).await?;

        Ok(campaign)
    }

    async fn create_dns_validation(&self, request: CreateDnsValidationRequest) -> Result<Campaign> {
        validate_dns_validation(&self.store, &request).await?;
        let campaign = self
            .store
            .campaigns
            .create(NewCampaign {
                name: request.name.clone(),
                campaign_type: CampaignType::DnsValidation,
                owner_user_id: request.owner_user_id,
                metadata: serde_json::json!({}),
            })
            .await?;

        self.store
            .phase_params
            .insert_dns_validation(&domainflow_storage::models::DnsValidationPhaseParams {
                campaign_id: campaign.id,
                source_generation_campaign_id: request.source_generation_campaign_id,
                persona_ids: Json(request.persona_ids),
                rotation_interval_seconds: request.rotation_interval_seconds,
                processing_speed_per_minute: request.processing_speed_per_minute,
                batch_size: request.batch_size,
                retry_attempts: request.retry_attempts,
            })
            .await?;

        Ok(campaign)
    }

    async fn create_http_keyword(&self, request: CreateHttpKeywordRequest) -> Result<Campaign> {
        validate_http_keyword(&self.store, &request).await?;
        let campaign = self
            .store
            .campaigns
            .create(NewCampaign {
                name: request.name.clone(),
                campaign_type: CampaignType::HttpKeyword,
                owner_user_id: request.owner_user_id,
                metadata: serde_json::json!({}),
            })
            .await?;

        self.store
            .phase_params
            .insert_http_keyword(&domainflow_storage::models::HttpKeywordPhaseParams {
                campaign_id: campaign.id,
                source_campaign_id: request.source_campaign_id,
                source_type: request.source_type,
                persona_ids: Json(request.persona_ids),
                keyword_set_ids: Json(request.keyword_set_ids),
                ad_hoc_keywords: Json(request.ad_hoc_keywords),
                proxy_ids: request.proxy_ids.map(Json),
                proxy_pool_id: request.proxy_pool_id,
                proxy_selection_strategy: request.proxy_selection_strategy,
                batch_size: request.batch_size,
                retry_attempts: request.retry_attempts,
                target_http_ports: Json(request.target_http_ports),
            })
            .await?;

        Ok(campaign)
    }

    /// pending → queued; enqueues the initial job. The campaign itself
    /// advances queued → running the first time the Worker Pool leases
    /// that job, not here (§4.9).
    pub async fn start(&self, id: Uuid, actor_user_id: Option<Uuid>) -> Result<Campaign> {
        let campaign = self.store.campaigns.get(id).await?;
        self.require_transition(campaign.status, CampaignStatus::Queued)?;
        let campaign = self.store.campaigns.transition_status(id, CampaignStatus::Queued, None).await?;
        self.queue.enqueue(id, campaign.campaign_type, None, serde_json::json!({}), None).await?;
        self.record_transition(id, actor_user_id, "campaign.start", CampaignStatus::Queued).await?;
        Ok(campaign)
    }

    /// running → paused. In-flight handler invocations observe this on
    /// their next batch boundary and exit without claiming more work
    /// (§4.9); this call itself doesn't touch the queue.
    pub async fn pause(&self, id: Uuid, actor_user_id: Option<Uuid>) -> Result<Campaign> {
        let campaign = self.store.campaigns.get(id).await?;
        self.require_transition(campaign.status, CampaignStatus::Paused)?;
        let campaign = self.store.campaigns.transition_status(id, CampaignStatus::Paused, None).await?;
        self.record_transition(id, actor_user_id, "campaign.pause", CampaignStatus::Paused).await?;
        Ok(campaign)
    }

    /// paused → running; re-enqueues a job only if none is already
    /// pending/retry/running for this campaign (§4.9).
    pub async fn resume(&self, id: Uuid, actor_user_id: Option<Uuid>) -> Result<Campaign> {
        let campaign = self.store.campaigns.get(id).await?;
        self.require_transition(campaign.status, CampaignStatus::Running)?;
        let campaign = self.store.campaigns.transition_status(id, CampaignStatus::Running, None).await?;
        if !self.queue.has_active_job(id).await? {
            self.queue.enqueue(id, campaign.campaign_type, None, serde_json::json!({}), None).await?;
        }
        self.record_transition(id, actor_user_id, "campaign.resume", CampaignStatus::Running).await?;
        Ok(campaign)
    }

    /// Any non-terminal state → cancelled. In-flight handlers abort at
    /// their next cancellation point (§4.9); this call only persists the
    /// status, it doesn't itself reach into the running handler.
    pub async fn cancel(&self, id: Uuid, actor_user_id: Option<Uuid>) -> Result<Campaign> {
        let campaign = self.store.campaigns.get(id).await?;
        self.require_transition(campaign.status, CampaignStatus::Cancelled)?;
        let campaign = self.store.campaigns.transition_status(id, CampaignStatus::Cancelled, None).await?;
        self.record_transition(id, actor_user_id, "campaign.cancel", CampaignStatus::Cancelled).await?;
        Ok(campaign)
    }

    /// Terminal-only soft delete; `CampaignRepository::soft_delete`
    /// itself enforces the terminal-state precondition (§3).
    pub async fn delete(&self, id: Uuid, actor_user_id: Option<Uuid>) -> Result<()> {
        self.store.campaigns.soft_delete(id).await?;
        self.store
            .audit_log
            .record(NewAuditLogEntry {
                user_id: actor_user_id,
                action: "campaign.delete".to_string(),
                entity_type: "campaign".to_string(),
                entity_id: id,
                details: serde_json::json!({}),
                client_ip: None,
                user_agent: None,
            })
            .await
    }

    async fn record_transition(
        &self,
        id: Uuid,
        actor_user_id: Option<Uuid>,
        action: &str,
        new_status: CampaignStatus,
    ) -> Result<()> {
        self.store
            .audit_log
            .record(NewAuditLogEntry {
                user_id: actor_user_id,
                action: action.to_string(),
                entity_type: "campaign".to_string(),
                entity_id: id,
                details: serde_json::json!({ "new_status": new_status }),
                client_ip: None,
                user_agent: None,
            })
            .await
    }

    pub async fn get_results(&self, id: Uuid, cursor: Option<Cursor>, limit: i64) -> Result<CampaignResults> {
        let campaign = self.store.campaigns.get(id).await?;
        match campaign.campaign_type {
            CampaignType::Generation => {
                self.store.generated_domains.page(id, cursor, limit).await.map(CampaignResults::Generation)
            }
            CampaignType::DnsValidation => {
                self.store.dns_results.page(id, cursor, limit).await.map(CampaignResults::DnsValidation)
            }
            CampaignType::HttpKeyword => {
                self.store.http_results.page(id, cursor, limit).await.map(CampaignResults::HttpKeyword)
            }
        }
    }

    fn require_transition(&self, from: CampaignStatus, to: CampaignStatus) -> Result<()> {
        if is_legal_transition(from, to) {
            Ok(())
        } else {
            Err(Error::conflict(format!("illegal campaign transition {from:?} -> {to:?}")))
        }
    }
}
