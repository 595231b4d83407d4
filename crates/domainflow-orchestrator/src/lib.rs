//! Campaign Orchestrator (§4.9): the control surface for campaign
//! creation, the lifecycle state machine, and results retrieval.

pub mod orchestrator;
pub mod requests;
pub mod state_machine;
pub mod validation;

pub use orchestrator::{CampaignResults, Orchestrator};
pub use requests::{CreateCampaignRequest, CreateDnsValidationRequest, CreateGenerationRequest, CreateHttpKeywordRequest};

#[cfg(test)]
mod tests {
    use super::*;
    use domainflow_core::{CampaignStatus, PatternType};
    use domainflow_queue::{JobQueue, QueueConfig};
    use domainflow_storage::db::run_migrations;
    use domainflow_storage::Store;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn test_orchestrator() -> Orchestrator {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Arc::new(Store::new(pool.clone()));
        let queue = Arc::new(JobQueue::new(pool, QueueConfig::default()));
        Orchestrator::new(store, queue)
    }

    fn generation_request(owner: Uuid) -> CreateGenerationRequest {
        CreateGenerationRequest {
            name: "test generation".into(),
            owner_user_id: owner,
            pattern_type: PatternType::SuffixVariable,
            variable_length: 2,
            character_set: "ab".into(),
            constant_string: "shop".into(),
            tld: "com".into(),
            num_domains_to_generate: 4,
        }
    }

    #[tokio::test]
    async fn create_validates_and_persists_generation_phase_params() {
        let orchestrator = test_orchestrator().await;
        let owner = Uuid::new_v4();
        let campaign = orchestrator
            .create(CreateCampaignRequest::Generation(generation_request(owner)))
            .await
            .expect("create generation campaign");
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert_eq!(campaign.total_items, 4);
    }

    #[tokio::test]
    async fn create_rejects_num_domains_exceeding_combinations() {
        let orchestrator = test_orchestrator().await;
        let owner = Uuid::new_v4();
        let mut request = generation_request(owner);
        request.num_domains_to_generate = 1_000_000;
        let err = orchestrator.create(CreateCampaignRequest::Generation(request)).await.unwrap_err();
        assert_eq!(err.kind(), domainflow_core::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn start_transitions_to_queued_and_enqueues_a_job() {
        let orchestrator = test_orchestrator().await;
        let owner = Uuid::new_v4();
        let campaign = orchestrator
            .create(CreateCampaignRequest::Generation(generation_request(owner)))
            .await
            .unwrap();

        let started = orchestrator.start(campaign.id, None).await.unwrap();
        assert_eq!(started.status, CampaignStatus::Queued);
    }

    #[tokio::test]
    async fn cannot_pause_a_campaign_that_was_never_started() {
        let orchestrator = test_orchestrator().await;
        let owner = Uuid::new_v4();
        let campaign = orchestrator
            .create(CreateCampaignRequest::Generation(generation_request(owner)))
            .await
            .unwrap();

        let err = orchestrator.pause(campaign.id, None).await.unwrap_err();
        assert_eq!(err.kind(), domainflow_core::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn delete_rejects_a_non_terminal_campaign() {
        let orchestrator = test_orchestrator().await;
        let owner = Uuid::new_v4();
        let campaign = orchestrator
            .create(CreateCampaignRequest::Generation(generation_request(owner)))
            .await
            .unwrap();
        orchestrator.start(campaign.id, None).await.unwrap();

        let err = orchestrator.delete(campaign.id, None).await.unwrap_err();
        assert_eq!(err.kind(), domainflow_core::ErrorKind::Conflict);
    }
}
