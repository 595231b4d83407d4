use crate::generation::GenerationHandler;
use domainflow_broadcast::Broadcaster;
use domainflow_core::{CampaignStatus, CampaignType, Result};
use domainflow_queue::JobQueue;
use domainflow_storage::Store;
use domainflow_validators::{DnsValidator, HttpKeywordValidator};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// How many concurrent worker tasks to run and which job types they poll
/// (§4.6, §6 Configuration: `worker_count`).
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub job_types: Vec<CampaignType>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        WorkerPoolConfig {
            worker_count: num_cpus() * 2,
            job_types: vec![CampaignType::Generation, CampaignType::DnsValidation, CampaignType::HttpKeyword],
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2)
}

/// A fixed-size group of worker tasks leasing and dispatching jobs (§4.6).
/// Each worker is single-flow; concurrency across workers is real OS
/// parallelism, same shape as the teacher's own supervised task groups.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    store: Arc<Store>,
    broadcaster: Arc<Broadcaster>,
    generation: Arc<GenerationHandler>,
    dns: Arc<DnsValidator>,
    http: Arc<HttpKeywordValidator>,
    config: WorkerPoolConfig,
    shutdown: CancellationToken,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<JobQueue>,
        store: Arc<Store>,
        broadcaster: Arc<Broadcaster>,
        generation: Arc<GenerationHandler>,
        dns: Arc<DnsValidator>,
        http: Arc<HttpKeywordValidator>,
        config: WorkerPoolConfig,
    ) -> Self {
        WorkerPool { queue, store, broadcaster, generation, dns, http, config, shutdown: CancellationToken::new() }
    }

    /// A handle that, when cancelled, tells every worker to stop accepting
    /// new leases and cancel in-flight handlers (§4.6 graceful shutdown).
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn `worker_count` tasks, each running [`Self::worker_loop`]. The
    /// caller retains the join handles to await clean exit during shutdown.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_count)
            .map(|index| {
                let pool = Arc::clone(self);
                let worker_id = format!("worker-{index}");
                tokio::spawn(async move { pool.worker_loop(worker_id).await })
            })
            .collect()
    }

    async fn worker_loop(&self, worker_id: String) {
        let poll_interval = self.queue.config().poll_interval;
        loop {
            if self.shutdown.is_cancelled() {
                info!(worker_id, "worker stopping: shutdown requested");
                return;
            }

            match self.queue.lease(&worker_id, &self.config.job_types).await {
                Ok(Some(job)) => {
                    self.run_job(&worker_id, job).await;
                }
                Ok(None) => {
                    let jitter = rand::rng().random_range(0.0..=0.25);
                    tokio::select! {
                        _ = tokio::time::sleep(poll_interval.mul_f64(1.0 + jitter)) => {}
                        _ = self.shutdown.cancelled() => {
                            info!(worker_id, "worker stopping: shutdown requested");
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(worker_id, error = %err, "lease attempt failed");
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    async fn run_job(&self, worker_id: &str, job: domainflow_storage::models::Job) {
        self.mark_running_on_first_lease(job.campaign_id).await;

        let heartbeat_interval = self.queue.config().heartbeat_interval;
        let job_token = self.shutdown.child_token();
        let heartbeat_handle = {
            let queue = Arc::clone(&self.queue);
            let worker_id = worker_id.to_string();
            let job_id = job.id;
            let token = job_token.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(heartbeat_interval);
                interval.tick().await; // first tick fires immediately; skip it
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if queue.heartbeat(job_id, &worker_id).await.is_err() {
                                return;
                            }
                        }
                        _ = token.cancelled() => return,
                    }
                }
            })
        };

        let outcome = tokio::select! {
            result = self.dispatch(job.campaign_id, job.job_type) => Some(result),
            _ = self.shutdown.cancelled() => None,
        };
        job_token.cancel();
        let _ = heartbeat_handle.await;

        match outcome {
            None => {
                // Shutdown won the race: release the lease so another
                // worker (or this one after restart) resumes the work.
                let _ = self.queue.fail(job.id, "worker shutdown before completion", true).await;
            }
            Some(Ok(progressed)) => {
                if let Err(err) = self.queue.complete(job.id).await {
                    warn!(job_id = %job.id, error = %err, "failed to mark job complete");
                }
                if progressed {
                    if let Err(err) = self
                        .queue
                        .enqueue(job.campaign_id, job.job_type, None, job.payload.0.clone(), Some(job.max_attempts))
                        .await
                    {
                        warn!(job_id = %job.id, error = %err, "failed to enqueue follow-up job");
                    }
                }
                self.publish_progress(job.campaign_id).await;
            }
            Some(Err(err)) => {
                let retryable = err.is_retryable();
                if let Err(fail_err) = self.queue.fail(job.id, &err.to_string(), retryable).await {
                    warn!(job_id = %job.id, error = %fail_err, "failed to record job failure");
                }
                self.publish_progress(job.campaign_id).await;
            }
        }
    }

    /// §4.9: a campaign transitions queued→running the first time one of
    /// its jobs is leased, not at `start()` time. Idempotent past the
    /// first lease since `transition_status` is only invoked when the
    /// campaign is still queued.
    async fn mark_running_on_first_lease(&self, campaign_id: Uuid) {
        if let Ok(campaign) = self.store.campaigns.get(campaign_id).await {
            if campaign.status == CampaignStatus::Queued {
                let _ = self.store.campaigns.transition_status(campaign_id, CampaignStatus::Running, None).await;
            }
        }
    }

    /// Dispatch to the handler for `job_type`, normalizing each handler's
    /// own `HandlerOutcome` down to "does this campaign have more work",
    /// since that's the only thing the supervisor needs to decide whether
    /// to requeue a follow-up job (§4.6).
    async fn dispatch(&self, campaign_id: Uuid, job_type: CampaignType) -> Result<bool> {
        match job_type {
            CampaignType::Generation => {
                use domainflow_workers_outcome::generation_progressed;
                let outcome = self.generation.run_batch(campaign_id).await?;
                Ok(generation_progressed(&outcome))
            }
            CampaignType::DnsValidation => {
                use domainflow_workers_outcome::dns_progressed;
                let outcome = self.dns.run_batch(campaign_id).await?;
                Ok(dns_progressed(&outcome))
            }
            CampaignType::HttpKeyword => {
                use domainflow_workers_outcome::http_progressed;
                let outcome = self.http.run_batch(campaign_id).await?;
                Ok(http_progressed(&outcome))
            }
        }
    }

    async fn publish_progress(&self, campaign_id: Uuid) {
        let Ok(campaign) = self.store.campaigns.get(campaign_id).await else { return };
        if campaign.status.is_terminal() {
            self.broadcaster.campaign_complete(
                campaign_id,
                campaign.status,
                campaign.total_items,
                campaign.successful_items,
                campaign.failed_items,
            );
        } else {
            self.broadcaster.campaign_progress(
                campaign_id,
                campaign.total_items,
                campaign.processed_items,
                campaign.successful_items,
                campaign.failed_items,
            );
        }
    }

    /// Trip the shutdown token and wait for every worker to exit (§4.6).
    pub async fn shutdown(&self, handles: Vec<JoinHandle<()>>) {
        self.shutdown.cancel();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Each worker handler's `HandlerOutcome` enum is local to its crate and
/// shaped for its own progress reporting; this module flattens the three
/// down to the single "more work remains" bit the pool needs to decide
/// on requeuing (§4.6). Kept separate from [`WorkerPool`] so the match
/// arms above read as dispatch, not outcome bookkeeping.
mod domainflow_workers_outcome {
    pub fn generation_progressed(outcome: &crate::generation::HandlerOutcome) -> bool {
        matches!(outcome, crate::generation::HandlerOutcome::Progressed { .. })
    }

    pub fn dns_progressed(outcome: &domainflow_validators::dns::HandlerOutcome) -> bool {
        matches!(outcome, domainflow_validators::dns::HandlerOutcome::Progressed { .. })
    }

    pub fn http_progressed(outcome: &domainflow_validators::http::HandlerOutcome) -> bool {
        matches!(outcome, domainflow_validators::http::HandlerOutcome::Progressed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_worker_count_tracks_available_parallelism() {
        let config = WorkerPoolConfig::default();
        assert!(config.worker_count >= 2);
        assert_eq!(config.job_types.len(), 3);
    }
}
