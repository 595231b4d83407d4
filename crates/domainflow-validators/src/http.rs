use domainflow_broadcast::Broadcaster;
use domainflow_core::{
    CampaignStatus, Error, HttpValidationStatus, PersonaSelectionStrategy, PersonaType, Result, RuleType,
};
use domainflow_registry::{HttpPersonaConfig, PersonaRegistry, ProxyPool};
use domainflow_storage::http_results::NewHttpKeywordResult;
use domainflow_storage::models::{KeywordRule, KeywordSet, Persona, Proxy};
use domainflow_storage::Store;
use regex::RegexBuilder;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const MAX_BODY_BYTES: usize = 1_048_576;

/// Outcome of one HTTP Keyword Validator invocation (§4.8 step 6).
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Progressed { processed: i64, successful: i64, failed: i64, remaining: i64 },
    Completed,
    Cancelled,
}

/// One domain awaiting an HTTP probe, regardless of which upstream phase
/// it was pulled from (§4.8 step 2).
struct PendingInput {
    domain_name: String,
    dns_result_id: Option<Uuid>,
}

enum FetchOutcome {
    Success { status: u16, headers: serde_json::Value, body: String },
    AccessDenied,
    ProxyError,
    Unreachable,
    DnsError,
    Timeout,
    Error,
}

/// HTTP Keyword Validator worker handler (§4.8).
pub struct HttpKeywordValidator {
    store: Arc<Store>,
    personas: Arc<PersonaRegistry>,
    proxies: Arc<ProxyPool>,
    broadcaster: Arc<Broadcaster>,
    tick: AtomicU64,
}

impl HttpKeywordValidator {
    pub fn new(
        store: Arc<Store>,
        personas: Arc<PersonaRegistry>,
        proxies: Arc<ProxyPool>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        HttpKeywordValidator { store, personas, proxies, broadcaster, tick: AtomicU64::new(0) }
    }

    pub async fn run_batch(&self, campaign_id: Uuid) -> Result<HandlerOutcome> {
        let campaign = self.store.campaigns.get(campaign_id).await?;
        if campaign.status != CampaignStatus::Running {
            return Ok(HandlerOutcome::Cancelled);
        }

        let params = self.store.phase_params.get_http_keyword(campaign_id).await?;
        let (inputs, remaining_after) = self.pull_batch(campaign_id, &params).await?;

        if inputs.is_empty() {
            self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
            return Ok(HandlerOutcome::Completed);
        }

        let active_personas = self.personas.get_active(PersonaType::Http).await?;
        let eligible: Vec<Persona> = active_personas
            .into_iter()
            .filter(|p| params.persona_ids.0.contains(&p.id))
            .collect();
        if eligible.is_empty() {
            return Err(Error::resource_exhausted("no enabled http persona assigned to this campaign"));
        }

        let keyword_sets = self.store.keyword_sets.get_many(&params.keyword_set_ids.0).await?;
        let proxy_ids = params.proxy_ids.as_ref().map(|j| j.0.clone());

        let mut results = Vec::with_capacity(inputs.len());
        let mut successful = 0i64;
        let mut failed = 0i64;

        for input in &inputs {
            let tick = self.tick.fetch_add(1, Ordering::Relaxed);
            let persona = PersonaRegistry::select(&eligible, PersonaSelectionStrategy::RoundRobin, tick)
                .expect("eligible is checked non-empty above");

            let record = self
                .probe_domain(
                    campaign_id,
                    &input.domain_name,
                    persona,
                    params.proxy_pool_id,
                    proxy_ids.as_deref(),
                    params.proxy_selection_strategy,
                    &params.target_http_ports.0,
                    params.retry_attempts,
                    &keyword_sets,
                    &params.ad_hoc_keywords.0,
                )
                .await;

            if record.validation_status == HttpValidationStatus::Success {
                successful += 1;
            } else {
                failed += 1;
            }

            self.broadcaster.validation_result(
                campaign_id,
                input.domain_name.clone(),
                format!("{:?}", record.validation_status),
                record.response_headers.clone(),
            );

            results.push(NewHttpKeywordResult {
                http_campaign_id: campaign_id,
                dns_result_id: input.dns_result_id,
                domain_name: input.domain_name.clone(),
                validation_status: record.validation_status,
                http_status: record.http_status,
                response_headers: record.response_headers,
                page_title: record.page_title,
                extracted_snippet: record.extracted_snippet,
                found_keywords_from_sets: record.found_keywords_from_sets,
                found_ad_hoc_keywords: record.found_ad_hoc_keywords,
                content_hash: record.content_hash,
                persona_id: Some(persona.id),
                proxy_id: record.proxy_id,
                attempts: record.attempts,
            });
        }

        let processed = results.len() as i64;
        let mut tx = self.store.pool.begin().await?;
        self.store.http_results.insert_batch(&mut tx, &results).await?;
        self.store
            .campaigns
            .increment_counters(&mut tx, campaign_id, processed, successful, failed)
            .await?;
        tx.commit().await?;

        if remaining_after == 0 {
            self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
            Ok(HandlerOutcome::Completed)
        } else {
            Ok(HandlerOutcome::Progressed { processed, successful, failed, remaining: remaining_after })
        }
    }

    async fn pull_batch(
        &self,
        campaign_id: Uuid,
        params: &domainflow_storage::models::HttpKeywordPhaseParams,
    ) -> Result<(Vec<PendingInput>, i64)> {
        match params.source_type {
            domainflow_core::SourceType::DomainGeneration => {
                let domains = self
                    .store
                    .generated_domains
                    .next_unprocessed_batch_for_http(params.source_campaign_id, campaign_id, params.batch_size)
                    .await?;
                let inputs = domains
                    .iter()
                    .map(|d| PendingInput { domain_name: d.domain_name.clone(), dns_result_id: None })
                    .collect();
                let remaining = self
                    .store
                    .generated_domains
                    .remaining_count(params.source_campaign_id, campaign_id)
                    .await?;
                Ok((inputs, remaining))
            }
            domainflow_core::SourceType::DnsValidation => {
                let rows = self
                    .store
                    .dns_results
                    .next_resolved_batch(params.source_campaign_id, campaign_id, params.batch_size)
                    .await?;
                let inputs = rows
                    .iter()
                    .map(|r| PendingInput { domain_name: r.domain_name.clone(), dns_result_id: Some(r.id) })
                    .collect();
                let remaining = self
                    .store
                    .dns_results
                    .remaining_resolved_count(params.source_campaign_id, campaign_id)
                    .await?;
                Ok((inputs, remaining))
            }
        }
    }

    /// Probe one domain: persona headers/TLS policy, proxy strategy with
    /// failure-exclusion, port fallback, keyword scan, classification
    /// (§4.8 steps 3-5).
    #[allow(clippy::too_many_arguments)]
    async fn probe_domain(
        &self,
        campaign_id: Uuid,
        domain_name: &str,
        persona: &Persona,
        proxy_pool_id: Option<Uuid>,
        proxy_ids: Option<&[Uuid]>,
        strategy: domainflow_core::ProxySelectionStrategy,
        ports: &[i64],
        retry_attempts: i64,
        keyword_sets: &[KeywordSet],
        ad_hoc_keywords: &[String],
    ) -> ProbeRecord {
        let persona_config: HttpPersonaConfig = match serde_json::from_value(persona.config_details.0.clone()) {
            Ok(c) => c,
            Err(_) => return ProbeRecord::error(HttpValidationStatus::Error, 0, None),
        };

        let uses_proxy = proxy_pool_id.is_some() || proxy_ids.is_some();
        let mut excluded: HashSet<Uuid> = HashSet::new();
        let attempts_ceiling = retry_attempts.max(1);
        let mut last_outcome = FetchOutcome::Error;
        let mut last_proxy: Option<Proxy> = None;
        let mut attempts = 0i64;

        'retry: for _ in 0..attempts_ceiling {
            attempts += 1;
            let proxy = if uses_proxy {
                match self
                    .proxies
                    .select(proxy_pool_id, proxy_ids, strategy, &excluded, campaign_id)
                    .await
                {
                    Ok(p) => Some(p),
                    Err(_) => {
                        last_outcome = FetchOutcome::ProxyError;
                        break 'retry;
                    }
                }
            } else {
                None
            };

            let client = match build_client(&persona_config, proxy.as_ref()) {
                Ok(c) => c,
                Err(_) => {
                    last_outcome = FetchOutcome::Error;
                    break 'retry;
                }
            };

            if let Some(p) = &proxy {
                self.proxies.mark_in_flight_start(p.id);
            }
            let outcome = self.fetch_first_success(&client, domain_name, ports).await;
            if let Some(p) = &proxy {
                self.proxies.mark_in_flight_done(p.id);
            }

            last_proxy = proxy.clone();
            match &outcome {
                FetchOutcome::ProxyError | FetchOutcome::Unreachable | FetchOutcome::Timeout => {
                    if let Some(p) = &proxy {
                        excluded.insert(p.id);
                        if let Ok(true) = self.proxies.report_failure(p.id).await {
                            self.broadcaster.proxy_status_update(p.id, false, None);
                        }
                    }
                    last_outcome = outcome;
                    continue 'retry;
                }
                _ => {
                    last_outcome = outcome;
                    break 'retry;
                }
            }
        }

        let proxy_id = last_proxy.as_ref().map(|p| p.id);
        match last_outcome {
            FetchOutcome::Success { status, headers, body } => {
                let title = extract_title(&body);
                let content_hash = Some(hex::encode(Sha256::digest(canonicalize(&body).as_bytes())));
                let (found_sets, found_ad_hoc) = scan_keywords(&body, keyword_sets, ad_hoc_keywords);
                let matched_any = !found_sets.is_empty() || !found_ad_hoc.is_empty();
                let is_2xx = (200..300).contains(&status);
                let validation_status = if status == 401 || status == 403 {
                    HttpValidationStatus::AccessDenied
                } else if is_2xx && matched_any {
                    HttpValidationStatus::Success
                } else if is_2xx {
                    HttpValidationStatus::KeywordsNotFound
                } else {
                    HttpValidationStatus::Error
                };
                ProbeRecord {
                    validation_status,
                    http_status: Some(status as i64),
                    response_headers: headers,
                    page_title: title,
                    extracted_snippet: Some(body.chars().take(512).collect()),
                    found_keywords_from_sets: found_sets,
                    found_ad_hoc_keywords: found_ad_hoc,
                    content_hash,
                    proxy_id,
                    attempts,
                }
            }
            FetchOutcome::AccessDenied => ProbeRecord::error(HttpValidationStatus::AccessDenied, attempts, proxy_id),
            FetchOutcome::ProxyError => ProbeRecord::error(HttpValidationStatus::ProxyError, attempts, proxy_id),
            FetchOutcome::Unreachable => ProbeRecord::error(HttpValidationStatus::Unreachable, attempts, proxy_id),
            FetchOutcome::DnsError => ProbeRecord::error(HttpValidationStatus::DnsError, attempts, proxy_id),
            FetchOutcome::Timeout => ProbeRecord::error(HttpValidationStatus::Timeout, attempts, proxy_id),
            FetchOutcome::Error => ProbeRecord::error(HttpValidationStatus::Error, attempts, proxy_id),
        }
    }

    /// Try each configured port in order; the first that yields any HTTP
    /// response (success or not) wins (§4.8 step 3).
    async fn fetch_first_success(&self, client: &reqwest::Client, domain_name: &str, ports: &[i64]) -> FetchOutcome {
        let mut last = FetchOutcome::Error;
        for &port in ports {
            let scheme = if port == 443 { "https" } else { "http" };
            let url = format!("{scheme}://{domain_name}:{port}/");
            match client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let headers = headers_to_json(response.headers());
                    let body = read_body_capped(response).await;
                    return FetchOutcome::Success { status, headers, body };
                }
                Err(e) if e.is_timeout() => last = FetchOutcome::Timeout,
                Err(e) if e.is_connect() => {
                    last = if e.to_string().to_lowercase().contains("dns") {
                        FetchOutcome::DnsError
                    } else {
                        FetchOutcome::Unreachable
                    };
                }
                Err(_) => last = FetchOutcome::Error,
            }
        }
        last
    }
}

struct ProbeRecord {
    validation_status: HttpValidationStatus,
    http_status: Option<i64>,
    response_headers: serde_json::Value,
    page_title: Option<String>,
    extracted_snippet: Option<String>,
    found_keywords_from_sets: Vec<String>,
    found_ad_hoc_keywords: Vec<String>,
    content_hash: Option<String>,
    proxy_id: Option<Uuid>,
    attempts: i64,
}

impl ProbeRecord {
    fn error(status: HttpValidationStatus, attempts: i64, proxy_id: Option<Uuid>) -> Self {
        ProbeRecord {
            validation_status: status,
            http_status: None,
            response_headers: serde_json::json!({}),
            page_title: None,
            extracted_snippet: None,
            found_keywords_from_sets: Vec::new(),
            found_ad_hoc_keywords: Vec::new(),
            content_hash: None,
            proxy_id,
            attempts,
        }
    }
}

fn build_client(config: &HttpPersonaConfig, proxy: Option<&Proxy>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .danger_accept_invalid_certs(config.tls_insecure_skip_verify);

    builder = if config.follow_redirects {
        builder.redirect(reqwest::redirect::Policy::limited(config.max_redirect_depth as usize))
    } else {
        builder.redirect(reqwest::redirect::Policy::none())
    };

    let mut headers = reqwest::header::HeaderMap::new();
    for (key, value) in &config.headers {
        if let (Ok(name), Ok(val)) = (
            reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            headers.insert(name, val);
        }
    }
    builder = builder.default_headers(headers);

    if let Some(proxy) = proxy {
        let scheme = match proxy.protocol {
            domainflow_core::ProxyProtocol::Http => "http",
            domainflow_core::ProxyProtocol::Https => "https",
            domainflow_core::ProxyProtocol::Socks5 => "socks5",
        };
        let proxy_url = format!("{scheme}://{}", proxy.address);
        let proxy_cfg = reqwest::Proxy::all(&proxy_url).map_err(|_| Error::internal("invalid proxy address"))?;
        builder = builder.proxy(proxy_cfg);
    }

    builder.build().map_err(Into::into)
}

async fn read_body_capped(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) => {
            let truncated = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
            String::from_utf8_lossy(truncated).into_owned()
        }
        Err(_) => String::new(),
    }
}

fn headers_to_json(headers: &reqwest::header::HeaderMap) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            map.insert(name.to_string(), serde_json::json!(v));
        }
    }
    serde_json::Value::Object(map)
}

fn extract_title(body: &str) -> Option<String> {
    let re = RegexBuilder::new(r"<title[^>]*>(.*?)</title>")
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()?;
    re.captures(body).map(|c| c[1].trim().to_string())
}

/// Canonicalise body content before hashing: collapse runs of whitespace
/// so inconsequential formatting changes don't change `content_hash`.
fn canonicalize(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn scan_keywords(body: &str, keyword_sets: &[KeywordSet], ad_hoc: &[String]) -> (Vec<String>, Vec<String>) {
    let mut from_sets = Vec::new();
    for set in keyword_sets {
        if let Some(rules) = &set.rules {
            for rule in &rules.0 {
                if rule_matches(body, rule) {
                    from_sets.push(rule.pattern.clone());
                }
            }
        }
    }

    let lowered = body.to_lowercase();
    let mut found_ad_hoc = Vec::new();
    for kw in ad_hoc {
        if lowered.contains(&kw.to_lowercase()) {
            found_ad_hoc.push(kw.clone());
        }
    }

    (from_sets, found_ad_hoc)
}

fn rule_matches(body: &str, rule: &KeywordRule) -> bool {
    match rule.rule_type {
        RuleType::Substring => {
            if rule.case_sensitive {
                body.contains(&rule.pattern)
            } else {
                body.to_lowercase().contains(&rule.pattern.to_lowercase())
            }
        }
        RuleType::Literal => {
            let haystack = if rule.case_sensitive { body.to_string() } else { body.to_lowercase() };
            let needle = if rule.case_sensitive { rule.pattern.clone() } else { rule.pattern.to_lowercase() };
            haystack.split_whitespace().any(|word| word.trim_matches(|c: char| !c.is_alphanumeric()) == needle)
        }
        RuleType::Regex => RegexBuilder::new(&rule.pattern)
            .case_insensitive(!rule.case_sensitive)
            .build()
            .map(|re| re.is_match(body))
            .unwrap_or(false),
    }
}
