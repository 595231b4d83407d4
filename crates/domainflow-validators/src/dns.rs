use crate::rate_limit::TokenBucket;
use dashmap::DashMap;
use domainflow_broadcast::Broadcaster;
use domainflow_core::{CampaignStatus, DnsValidationStatus, Error, PersonaSelectionStrategy, PersonaType, Result};
use domainflow_registry::PersonaRegistry;
use domainflow_storage::dns_results::NewDnsResult;
use domainflow_storage::models::Persona;
use domainflow_storage::Store;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use serde_json::{json, Value};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Outcome of one DNS Validator invocation (§4.7 step 5).
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Progressed { processed: i64, successful: i64, failed: i64, remaining: i64 },
    Completed,
    Cancelled,
}

enum DnsFailure {
    Transient,
    Terminal,
}

/// DNS Validator worker handler (§4.7). One `DnsValidator` is shared across
/// worker tasks; resolvers are cached per persona since building one per
/// domain would be wasteful.
pub struct DnsValidator {
    store: Arc<Store>,
    personas: Arc<PersonaRegistry>,
    broadcaster: Arc<Broadcaster>,
    resolver_cache: DashMap<Uuid, TokioAsyncResolver>,
    /// Rotation clock baseline: persona rotation advances on elapsed time
    /// against `rotation_interval_seconds`, not once per domain processed.
    started_at: Instant,
}

impl DnsValidator {
    pub fn new(store: Arc<Store>, personas: Arc<PersonaRegistry>, broadcaster: Arc<Broadcaster>) -> Self {
        DnsValidator {
            store,
            personas,
            broadcaster,
            resolver_cache: DashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Run one batch: steps 1-5 of §4.7. Called repeatedly by the worker
    /// pool's `dns_validation` job handler until it reports `Completed` or
    /// `Cancelled`.
    pub async fn run_batch(&self, campaign_id: Uuid) -> Result<HandlerOutcome> {
        let campaign = self.store.campaigns.get(campaign_id).await?;
        if campaign.status != CampaignStatus::Running {
            return Ok(HandlerOutcome::Cancelled);
        }

        let params = self.store.phase_params.get_dns_validation(campaign_id).await?;
        let batch = self
            .store
            .generated_domains
            .next_unvalidated_batch(params.source_generation_campaign_id, campaign_id, params.batch_size)
            .await?;

        if batch.is_empty() {
            self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
            return Ok(HandlerOutcome::Completed);
        }

        let active_personas = self.personas.get_active(PersonaType::Dns).await?;
        let eligible: Vec<Persona> = active_personas
            .into_iter()
            .filter(|p| params.persona_ids.0.contains(&p.id))
            .collect();
        if eligible.is_empty() {
            return Err(Error::resource_exhausted("no enabled dns persona assigned to this campaign"));
        }

        let bucket = TokenBucket::new(params.processing_speed_per_minute);
        let rotation_interval = params.rotation_interval_seconds.max(1) as u64;
        let mut results = Vec::with_capacity(batch.len());
        let mut successful = 0i64;
        let mut failed = 0i64;

        for domain in &batch {
            bucket.acquire().await;
            let tick = self.started_at.elapsed().as_secs() / rotation_interval;
            let persona = PersonaRegistry::select(&eligible, PersonaSelectionStrategy::RoundRobin, tick)
                .expect("eligible is checked non-empty above");
            let (status, records, attempts) =
                self.resolve_with_retries(persona, &domain.domain_name, params.retry_attempts).await;

            if status == DnsValidationStatus::Resolved {
                successful += 1;
            } else {
                failed += 1;
            }

            self.broadcaster.validation_result(
                campaign_id,
                domain.domain_name.clone(),
                format!("{status:?}"),
                records.clone(),
            );

            results.push(NewDnsResult {
                dns_campaign_id: campaign_id,
                generated_domain_id: Some(domain.id),
                domain_name: domain.domain_name.clone(),
                validation_status: status,
                dns_records: records,
                validating_persona_id: Some(persona.id),
                attempt_count: attempts,
            });
        }

        let processed = results.len() as i64;
        let mut tx = self.store.pool.begin().await?;
        self.store.dns_results.insert_batch(&mut tx, &results).await?;
        self.store
            .campaigns
            .increment_counters(&mut tx, campaign_id, processed, successful, failed)
            .await?;
        tx.commit().await?;

        let remaining = self
            .store
            .generated_domains
            .remaining_count(params.source_generation_campaign_id, campaign_id)
            .await?;

        if remaining == 0 {
            self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
            Ok(HandlerOutcome::Completed)
        } else {
            Ok(HandlerOutcome::Progressed { processed, successful, failed, remaining })
        }
    }

    async fn resolve_with_retries(
        &self,
        persona: &Persona,
        domain: &str,
        retry_attempts: i64,
    ) -> (DnsValidationStatus, Value, i64) {
        let resolver = match self.resolver_for(persona) {
            Ok(resolver) => resolver,
            Err(_) => return (DnsValidationStatus::Error, json!({}), 0),
        };

        let mut attempt = 0i64;
        let ceiling = retry_attempts.max(1);
        loop {
            attempt += 1;
            match resolve_once(&resolver, domain).await {
                Ok(records) => return (DnsValidationStatus::Resolved, records, attempt),
                Err(DnsFailure::Terminal) => return (DnsValidationStatus::Unresolved, json!({}), attempt),
                Err(DnsFailure::Transient) => {
                    if attempt >= ceiling {
                        return (DnsValidationStatus::Error, json!({}), attempt);
                    }
                }
            }
        }
    }

    /// Build (or fetch from cache) the resolver configured with a
    /// persona's resolver addresses (§4.3).
    fn resolver_for(&self, persona: &Persona) -> Result<TokioAsyncResolver> {
        if let Some(resolver) = self.resolver_cache.get(&persona.id) {
            return Ok(resolver.clone());
        }

        let config: domainflow_registry::DnsPersonaConfig =
            serde_json::from_value(persona.config_details.0.clone())
                .map_err(|e| Error::internal(format!("corrupt dns persona config: {e}")))?;

        let addrs: Vec<IpAddr> = config
            .resolvers
            .iter()
            .filter_map(|r| IpAddr::from_str(r).ok())
            .collect();
        if addrs.is_empty() {
            return Err(Error::validation(format!(
                "dns persona {} has no parseable resolver addresses",
                persona.id
            )));
        }

        let group = NameServerConfigGroup::from_ips_clear(&addrs, 53, true);
        let resolver_config = ResolverConfig::from_parts(None, Vec::new(), group);
        let resolver = TokioAsyncResolver::tokio(resolver_config, ResolverOpts::default());
        self.resolver_cache.insert(persona.id, resolver.clone());
        Ok(resolver)
    }
}

/// Resolve A/AAAA/CNAME/MX for `domain`. A/AAAA failure drives the
/// transient-vs-terminal classification (§4.7); CNAME/MX are best-effort
/// enrichment and never fail the overall lookup.
async fn resolve_once(resolver: &TokioAsyncResolver, domain: &str) -> std::result::Result<Value, DnsFailure> {
    let ip_lookup = resolver.lookup_ip(domain).await.map_err(classify_error)?;
    let addresses: Vec<String> = ip_lookup.iter().map(|ip| ip.to_string()).collect();

    let mut records = serde_json::Map::new();
    records.insert("a_aaaa".to_string(), json!(addresses));

    if let Ok(mx_lookup) = resolver.mx_lookup(domain).await {
        let mxs: Vec<String> = mx_lookup
            .iter()
            .map(|mx| format!("{} {}", mx.preference(), mx.exchange()))
            .collect();
        records.insert("mx".to_string(), json!(mxs));
    }

    if let Ok(cname_lookup) = resolver.lookup(domain, RecordType::CNAME).await {
        let cnames: Vec<String> = cname_lookup
            .record_iter()
            .filter_map(|record| match record.data() {
                Some(RData::CNAME(name)) => Some(name.to_string()),
                _ => None,
            })
            .collect();
        records.insert("cname".to_string(), json!(cnames));
    }

    Ok(Value::Object(records))
}

/// NXDOMAIN is terminal (`unresolved`); everything else — timeouts,
/// SERVFAIL, connection failures — is transient and eligible for retry
/// (§4.7).
fn classify_error(err: hickory_resolver::ResolveError) -> DnsFailure {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                DnsFailure::Terminal
            } else {
                DnsFailure::Transient
            }
        }
        _ => DnsFailure::Transient,
    }
}
