//! Transactional access to campaigns, phase parameters, results, personas,
//! proxies, keyword sets, and generator offset state.
//!
//! Every multi-row mutation on campaign progress runs inside one
//! transaction opened with [`db::begin_immediate`], which stands in for
//! Postgres's `SELECT ... FOR UPDATE` under SQLite's single-writer model.

pub mod audit;
pub mod campaigns;
pub mod db;
pub mod dns_results;
pub mod domains;
pub mod generator_state;
pub mod http_results;
pub mod keyword_sets;
pub mod models;
pub mod personas;
pub mod phase_params;
pub mod proxies;

pub use audit::AuditLogRepository;
pub use campaigns::CampaignRepository;
pub use db::{connect, run_migrations, DatabaseConfig};
pub use dns_results::DnsResultRepository;
pub use domains::GeneratedDomainRepository;
pub use generator_state::GeneratorConfigStateRepository;
pub use http_results::HttpKeywordResultRepository;
pub use keyword_sets::KeywordSetRepository;
pub use personas::PersonaRepository;
pub use phase_params::PhaseParamsRepository;
pub use proxies::ProxyRepository;

/// Bundles every repository behind one handle so services construct a
/// single `Store` rather than threading nine pool clones through their
/// constructors.
#[derive(Clone)]
pub struct Store {
    pub campaigns: std::sync::Arc<CampaignRepository>,
    pub phase_params: std::sync::Arc<PhaseParamsRepository>,
    pub generated_domains: std::sync::Arc<GeneratedDomainRepository>,
    pub dns_results: std::sync::Arc<DnsResultRepository>,
    pub http_results: std::sync::Arc<HttpKeywordResultRepository>,
    pub personas: std::sync::Arc<PersonaRepository>,
    pub proxies: std::sync::Arc<ProxyRepository>,
    pub keyword_sets: std::sync::Arc<KeywordSetRepository>,
    pub generator_state: std::sync::Arc<GeneratorConfigStateRepository>,
    pub audit_log: std::sync::Arc<AuditLogRepository>,
    pub pool: sqlx::SqlitePool,
}

impl Store {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Store {
            campaigns: std::sync::Arc::new(CampaignRepository::new(pool.clone())),
            phase_params: std::sync::Arc::new(PhaseParamsRepository::new(pool.clone())),
            generated_domains: std::sync::Arc::new(GeneratedDomainRepository::new(pool.clone())),
            dns_results: std::sync::Arc::new(DnsResultRepository::new(pool.clone())),
            http_results: std::sync::Arc::new(HttpKeywordResultRepository::new(pool.clone())),
            personas: std::sync::Arc::new(PersonaRepository::new(pool.clone())),
            proxies: std::sync::Arc::new(ProxyRepository::new(pool.clone())),
            keyword_sets: std::sync::Arc::new(KeywordSetRepository::new(pool.clone())),
            generator_state: std::sync::Arc::new(GeneratorConfigStateRepository::new(pool.clone())),
            audit_log: std::sync::Arc::new(AuditLogRepository::new(pool.clone())),
            pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::NewCampaign;
    use domainflow_core::CampaignType;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");
        run_migrations(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn create_and_fetch_campaign_round_trips() {
        let store = Store::new(test_pool().await);
        let created = store
            .campaigns
            .create(NewCampaign {
                name: "test campaign".into(),
                campaign_type: CampaignType::Generation,
                owner_user_id: uuid::Uuid::new_v4(),
                metadata: serde_json::json!({"note": "hello"}),
            })
            .await
            .expect("create campaign");

        let fetched = store.campaigns.get(created.id).await.expect("fetch campaign");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "test campaign");
        assert_eq!(fetched.status, domainflow_core::CampaignStatus::Pending);
        assert_eq!(fetched.metadata.0["note"], "hello");
    }

    #[tokio::test]
    async fn soft_delete_rejects_non_terminal_campaign() {
        let store = Store::new(test_pool().await);
        let created = store
            .campaigns
            .create(NewCampaign {
                name: "still running".into(),
                campaign_type: CampaignType::Generation,
                owner_user_id: uuid::Uuid::new_v4(),
                metadata: serde_json::json!({}),
            })
            .await
            .expect("create campaign");

        let err = store.campaigns.soft_delete(created.id).await.unwrap_err();
        assert_eq!(err.kind(), domainflow_core::ErrorKind::Conflict);
    }
}
