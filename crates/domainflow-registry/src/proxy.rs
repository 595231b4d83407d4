use dashmap::DashMap;
use domainflow_core::{Error, ProxySelectionStrategy, Result};
use domainflow_storage::models::Proxy;
use domainflow_storage::ProxyRepository;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Health-check and degradation knobs named in the Configuration list
/// (§6).
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    pub health_check_interval: Duration,
    pub unhealthy_streak_threshold: i64,
    pub probe_url: String,
    pub probe_timeout: Duration,
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        ProxyPoolConfig {
            health_check_interval: Duration::from_secs(60),
            unhealthy_streak_threshold: 3,
            probe_url: "https://www.google.com/generate_204".to_string(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Process-local selection state: round-robin cursors and in-flight
/// counters. Guarded by short sync critical sections, reconciled
/// periodically from persisted proxy health (§5), never an async mutex
/// since nothing here yields mid-section.
pub struct ProxyPool {
    repo: Arc<ProxyRepository>,
    config: ProxyPoolConfig,
    round_robin_cursors: DashMap<Uuid, AtomicUsize>,
    in_flight: DashMap<Uuid, AtomicI64>,
    rng_lock: Mutex<()>,
}

impl ProxyPool {
    pub fn new(repo: Arc<ProxyRepository>, config: ProxyPoolConfig) -> Self {
        ProxyPool {
            repo,
            config,
            round_robin_cursors: DashMap::new(),
            in_flight: DashMap::new(),
            rng_lock: Mutex::new(()),
        }
    }

    /// Candidate proxies for a selection request: either the pool behind
    /// `pool_id` or the explicit `proxy_ids` list (the orchestrator's
    /// validation rule in §4.9 guarantees exactly one of these is set).
    async fn candidates(
        &self,
        pool_id: Option<Uuid>,
        proxy_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Proxy>> {
        match (pool_id, proxy_ids) {
            (Some(pool_id), _) => self.repo.list_pool_members(pool_id).await,
            (None, Some(ids)) => self.repo.list_by_ids(ids).await,
            (None, None) => Err(Error::validation(
                "a proxy selection requires either proxy_pool_id or proxy_ids",
            )),
        }
    }

    /// Select a proxy under `strategy`, excluding any in `excluded` (prior
    /// failures for this attempt). Returns `resource_exhausted` when no
    /// eligible proxy remains (§4.4).
    pub async fn select(
        &self,
        pool_id: Option<Uuid>,
        proxy_ids: Option<&[Uuid]>,
        strategy: ProxySelectionStrategy,
        excluded: &HashSet<Uuid>,
        scope_key: Uuid,
    ) -> Result<Proxy> {
        let eligible: Vec<Proxy> = self
            .candidates(pool_id, proxy_ids)
            .await?
            .into_iter()
            .filter(|p| p.is_eligible() && !excluded.contains(&p.id))
            .collect();

        if eligible.is_empty() {
            return Err(Error::resource_exhausted("no healthy proxy available for selection"));
        }

        match strategy {
            ProxySelectionStrategy::RoundRobin => {
                let cursor = self
                    .round_robin_cursors
                    .entry(scope_key)
                    .or_insert_with(|| AtomicUsize::new(0));
                let index = cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
                Ok(eligible[index].clone())
            }
            ProxySelectionStrategy::Random => {
                let _guard = self.rng_lock.lock();
                let mut rng = rand::rng();
                Ok(eligible.choose(&mut rng).expect("eligible is non-empty").clone())
            }
            ProxySelectionStrategy::LeastUsed => {
                let mut best: Option<&Proxy> = None;
                let mut best_in_flight = i64::MAX;
                for proxy in &eligible {
                    let count = self
                        .in_flight
                        .entry(proxy.id)
                        .or_insert_with(|| AtomicI64::new(0))
                        .load(Ordering::Relaxed);
                    let is_better = count < best_in_flight
                        || (count == best_in_flight
                            && best.is_some_and(|b| {
                                proxy.latency_ms.unwrap_or(i64::MAX)
                                    < b.latency_ms.unwrap_or(i64::MAX)
                            }));
                    if best.is_none() || is_better {
                        best = Some(proxy);
                        best_in_flight = count;
                    }
                }
                Ok(best.expect("eligible is non-empty").clone())
            }
        }
    }

    pub fn mark_in_flight_start(&self, proxy_id: Uuid) {
        self.in_flight
            .entry(proxy_id)
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_in_flight_done(&self, proxy_id: Uuid) {
        if let Some(counter) = self.in_flight.get(&proxy_id) {
            counter.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Report a proxy-layer failure observed by a validator handler
    /// (§4.8). Once the failure streak crosses the configured threshold
    /// the proxy is marked unhealthy; the caller is told whether that
    /// transition just happened so it can broadcast `proxy_status_update`
    /// exactly once.
    pub async fn report_failure(&self, proxy_id: Uuid) -> Result<bool> {
        self.repo.record_health_check(proxy_id, false, "request_failed", None).await?;
        self.repo
            .degrade_if_streak_exceeds(proxy_id, self.config.unhealthy_streak_threshold)
            .await
    }

    /// One iteration of the health-check loop (§4.4): probe every enabled
    /// proxy and persist the outcome. Intended to be called on a
    /// `tokio::time::interval` tick by the daemon, not spawned internally,
    /// so tests can drive it deterministically.
    pub async fn run_health_checks(&self) -> Result<Vec<(Uuid, bool)>> {
        let proxies = self.repo.list_enabled().await?;
        let mut transitions = Vec::new();
        for proxy in proxies {
            let was_healthy = proxy.healthy;
            let (healthy, status, latency_ms) = self.probe(&proxy).await;
            self.repo.record_health_check(proxy.id, healthy, status, latency_ms).await?;
            if was_healthy != healthy {
                transitions.push((proxy.id, healthy));
            }
        }
        Ok(transitions)
    }

    async fn probe(&self, proxy: &Proxy) -> (bool, &'static str, Option<i64>) {
        let proxy_url = format!(
            "{}://{}",
            match proxy.protocol {
                domainflow_core::ProxyProtocol::Http => "http",
                domainflow_core::ProxyProtocol::Https => "https",
                domainflow_core::ProxyProtocol::Socks5 => "socks5",
            },
            proxy.address
        );
        let Ok(proxy_cfg) = reqwest::Proxy::all(&proxy_url) else {
            return (false, "invalid_proxy_address", None);
        };
        let Ok(client) = reqwest::Client::builder()
            .proxy(proxy_cfg)
            .timeout(self.config.probe_timeout)
            .build()
        else {
            return (false, "client_build_failed", None);
        };

        let started = std::time::Instant::now();
        match client.get(&self.config.probe_url).send().await {
            Ok(resp) if resp.status().is_success() || resp.status().as_u16() == 204 => {
                (true, "ok", Some(started.elapsed().as_millis() as i64))
            }
            Ok(resp) => (false, status_label(resp.status().as_u16()), None),
            Err(e) if e.is_timeout() => (false, "timeout", None),
            Err(_) => (false, "connect_error", None),
        }
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        401 | 403 => "auth_rejected",
        500..=599 => "server_error",
        _ => "unexpected_status",
    }
}
