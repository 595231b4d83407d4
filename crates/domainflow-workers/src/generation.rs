use domainflow_broadcast::Broadcaster;
use domainflow_core::{CampaignStatus, Result};
use domainflow_generator::GenerationParams;
use domainflow_storage::Store;
use std::sync::Arc;
use uuid::Uuid;

/// One generation invocation's worth of freshly emitted domains per
/// transaction, bounding how long a single job lease holds the campaign
/// row (§4.2, §5).
const GENERATION_BATCH_SIZE: i64 = 500;

/// Outcome of one Domain Generator invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Progressed { emitted: i64, remaining: i64 },
    Completed,
    Cancelled,
}

/// Domain Generator worker handler: draws the next batch of consecutive
/// indices for a generation campaign, persists them, and advances both
/// the campaign's own offset and the shared `Generator Config State`
/// offset used to coordinate campaigns with an identical config (§4.2).
pub struct GenerationHandler {
    store: Arc<Store>,
    broadcaster: Arc<Broadcaster>,
}

impl GenerationHandler {
    pub fn new(store: Arc<Store>, broadcaster: Arc<Broadcaster>) -> Self {
        GenerationHandler { store, broadcaster }
    }

    pub async fn run_batch(&self, campaign_id: Uuid) -> Result<HandlerOutcome> {
        let campaign = self.store.campaigns.get(campaign_id).await?;
        if campaign.status != CampaignStatus::Running {
            return Ok(HandlerOutcome::Cancelled);
        }

        let phase_params = self.store.phase_params.get_generation(campaign_id).await?;
        let remaining_for_campaign = phase_params.num_domains_to_generate - campaign.processed_items;
        if remaining_for_campaign <= 0 {
            self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
            return Ok(HandlerOutcome::Completed);
        }

        let params = GenerationParams {
            pattern_type: phase_params.pattern_type,
            variable_length: phase_params.variable_length as u32,
            character_set: phase_params.character_set.chars().collect(),
            constant_string: phase_params.constant_string.clone(),
            tld: phase_params.tld.clone(),
        };
        let config_hash = domainflow_generator::config_hash(&params);
        let config_details = serde_json::to_value(&phase_params)?;
        self.store.generator_state.get_or_create(&config_hash, &config_details).await?;

        let want = remaining_for_campaign.min(GENERATION_BATCH_SIZE);
        let mut offset = phase_params.current_offset;

        loop {
            if offset >= phase_params.total_possible_combinations {
                self.store
                    .campaigns
                    .transition_status(
                        campaign_id,
                        CampaignStatus::Failed,
                        Some("generation space exhausted before num_domains_to_generate was reached"),
                    )
                    .await?;
                return Ok(HandlerOutcome::Completed);
            }

            let batch_count = want.min(phase_params.total_possible_combinations - offset);
            let entries = domainflow_generator::generate_batch(&params, offset, batch_count)?;
            let new_offset = offset + entries.len() as i64;

            let mut tx = self.store.pool.begin().await?;
            let claimed = self
                .store
                .generator_state
                .advance(&mut tx, &config_hash, offset, new_offset)
                .await?;
            if !claimed {
                tx.rollback().await?;
                let shared = self.store.generator_state.get(&config_hash).await?;
                offset = shared.map(|s| s.last_offset).unwrap_or(offset);
                continue;
            }

            let domain_names: Vec<String> = entries.iter().map(|e| e.domain_name.clone()).collect();
            let offsets: Vec<i64> = entries.iter().map(|e| e.offset).collect();
            self.store
                .generated_domains
                .insert_batch(&mut tx, campaign_id, &domain_names, &offsets)
                .await?;
            self.store.phase_params.advance_offset(&mut tx, campaign_id, new_offset).await?;
            let emitted = entries.len() as i64;
            self.store
                .campaigns
                .increment_counters(&mut tx, campaign_id, emitted, emitted, 0)
                .await?;
            tx.commit().await?;

            for entry in &entries {
                self.broadcaster.domain_generated(campaign_id, entry.domain_name.clone(), entry.offset);
            }

            let remaining = (phase_params.num_domains_to_generate - campaign.processed_items - emitted).max(0);
            return if remaining == 0 {
                self.store.campaigns.transition_status(campaign_id, CampaignStatus::Completed, None).await?;
                Ok(HandlerOutcome::Completed)
            } else {
                Ok(HandlerOutcome::Progressed { emitted, remaining })
            };
        }
    }
}
