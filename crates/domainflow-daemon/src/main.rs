//! `domainflowd`: the process that owns the worker pool and the `/api/v2`
//! HTTP/WebSocket server (§4.6, §6). Config comes from the environment,
//! overridable at the CLI for the handful of knobs operators touch most.

mod config;
mod logging;

use crate::config::DomainFlowConfig;
use anyhow::Context;
use clap::Parser;
use domainflow_api::{ApiState, Registries};
use domainflow_broadcast::Broadcaster;
use domainflow_orchestrator::Orchestrator;
use domainflow_queue::JobQueue;
use domainflow_registry::{PersonaRegistry, ProxyPool};
use domainflow_storage::db::{connect, run_migrations};
use domainflow_storage::Store;
use domainflow_validators::{DnsValidator, HttpKeywordValidator};
use domainflow_workers::{GenerationHandler, WorkerPool, WorkerPoolConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "domainflowd", about = "DomainFlow campaign orchestration daemon")]
struct Cli {
    /// Overrides DOMAINFLOW_DATABASE_URL for this run.
    #[arg(long)]
    database_url: Option<String>,

    /// Overrides DOMAINFLOW_BIND_ADDRESS for this run.
    #[arg(long)]
    bind_address: Option<String>,

    /// Overrides DOMAINFLOW_LOG_LEVEL for this run.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines regardless of DOMAINFLOW_LOG_JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = DomainFlowConfig::from_env();

    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(addr) = cli.bind_address {
        config.bind_address = addr;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.log_json {
        config.logging.json_format = true;
    }

    logging::init_logging(&config.logging).context("failed to initialize logging")?;

    tracing::info!(bind_address = %config.bind_address, "starting domainflowd");

    let pool = connect(&config.database).await.context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;

    let store = Arc::new(Store::new(pool.clone()));
    let queue = Arc::new(JobQueue::new(pool.clone(), config.queue.clone()));
    let broadcaster = Arc::new(Broadcaster::new(config.broadcast.subscriber_buffer_size));
    let personas = Arc::new(PersonaRegistry::new(store.personas.clone()));
    let proxies = Arc::new(ProxyPool::new(store.proxies.clone(), config.proxy.clone()));

    let generation = Arc::new(GenerationHandler::new(store.clone(), broadcaster.clone()));
    let dns = Arc::new(DnsValidator::new(store.clone(), personas.clone(), broadcaster.clone()));
    let http_keyword = Arc::new(HttpKeywordValidator::new(
        store.clone(),
        personas.clone(),
        proxies.clone(),
        broadcaster.clone(),
    ));

    let orchestrator = Arc::new(Orchestrator::new(store.clone(), queue.clone()));

    let worker_pool = Arc::new(WorkerPool::new(
        queue.clone(),
        store.clone(),
        broadcaster.clone(),
        generation,
        dns,
        http_keyword,
        WorkerPoolConfig { worker_count: config.workers.worker_count, job_types: config.workers.job_types.clone() },
    ));
    let worker_shutdown = worker_pool.shutdown_handle();
    let worker_handles = worker_pool.spawn();

    let api_state = ApiState {
        store,
        orchestrator,
        broadcaster: broadcaster.clone(),
        registry: Arc::new(Registries { personas, proxies: proxies.clone() }),
    };
    let app = domainflow_api::create_router(api_state);

    let shutdown_token = CancellationToken::new();

    let health_check_shutdown = shutdown_token.clone();
    let health_check_interval = config.proxy.health_check_interval;
    let proxy_pool_for_health = proxies;
    let broadcaster_for_health = broadcaster;
    let health_check_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(health_check_interval);
        loop {
            tokio::select! {
                _ = health_check_shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match proxy_pool_for_health.run_health_checks().await {
                        Ok(changes) => {
                            for (proxy_id, healthy) in changes {
                                broadcaster_for_health.proxy_status_update(proxy_id, healthy, None);
                            }
                        }
                        Err(error) => tracing::warn!(%error, "proxy health check round failed"),
                    }
                }
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    let server_shutdown = shutdown_token.clone();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
        result = server_task => {
            if let Ok(Err(error)) = result {
                tracing::error!(%error, "http server exited with an error");
            }
        }
    }

    shutdown_token.cancel();
    worker_shutdown.cancel();

    for handle in worker_handles {
        let _ = handle.await;
    }
    let _ = health_check_task.await;
    // Give in-flight connections a moment past graceful_shutdown's own
    // drain before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;

    tracing::info!("domainflowd shut down cleanly");
    Ok(())
}
