use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One publishable event (§4.10). Tagged by `type` on the wire so the
/// WebSocket layer can forward these frames with no further mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CampaignProgress {
        campaign_id: Uuid,
        total: i64,
        processed: i64,
        successful: i64,
        failed: i64,
        progress: f64,
        sequence_number: u64,
    },
    CampaignComplete {
        campaign_id: Uuid,
        status: domainflow_core::CampaignStatus,
        total: i64,
        successful: i64,
        failed: i64,
        sequence_number: u64,
    },
    DomainGenerated {
        campaign_id: Uuid,
        domain: String,
        offset_index: i64,
        sequence_number: u64,
    },
    ValidationResult {
        campaign_id: Uuid,
        domain: String,
        status: String,
        details: serde_json::Value,
        sequence_number: u64,
    },
    ProxyStatusUpdate {
        proxy_id: Uuid,
        healthy: bool,
        latency_ms: Option<i64>,
        sequence_number: u64,
    },
    SystemNotification {
        level: String,
        message: String,
        sequence_number: u64,
    },
    /// Synthetic marker a subscriber receives in place of the events it
    /// missed while lagging behind the ring buffer (§4.10). `count` is
    /// `tokio::sync::broadcast`'s own lagged-message count.
    Dropped { count: u64, sequence_number: u64 },
}

impl Event {
    /// The campaign this event concerns, if any — used for per-subscriber
    /// `campaign={id}` filtering. Pool-wide events (`proxy_status_update`,
    /// `system_notification`, `dropped`) have none and are delivered to
    /// every subscriber regardless of filter.
    pub fn campaign_id(&self) -> Option<Uuid> {
        match self {
            Event::CampaignProgress { campaign_id, .. }
            | Event::CampaignComplete { campaign_id, .. }
            | Event::DomainGenerated { campaign_id, .. }
            | Event::ValidationResult { campaign_id, .. } => Some(*campaign_id),
            Event::ProxyStatusUpdate { .. } | Event::SystemNotification { .. } | Event::Dropped { .. } => None,
        }
    }

    /// This event's own sequence number, regardless of variant.
    pub fn sequence_number(&self) -> u64 {
        match self {
            Event::CampaignProgress { sequence_number, .. }
            | Event::CampaignComplete { sequence_number, .. }
            | Event::DomainGenerated { sequence_number, .. }
            | Event::ValidationResult { sequence_number, .. }
            | Event::ProxyStatusUpdate { sequence_number, .. }
            | Event::SystemNotification { sequence_number, .. }
            | Event::Dropped { sequence_number, .. } => *sequence_number,
        }
    }

    /// The wire `type` tag, matching `#[serde(rename_all = "snake_case")]`
    /// above — kept in sync by hand since serde doesn't expose it back.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::CampaignProgress { .. } => "campaign_progress",
            Event::CampaignComplete { .. } => "campaign_complete",
            Event::DomainGenerated { .. } => "domain_generated",
            Event::ValidationResult { .. } => "validation_result",
            Event::ProxyStatusUpdate { .. } => "proxy_status_update",
            Event::SystemNotification { .. } => "system_notification",
            Event::Dropped { .. } => "dropped",
        }
    }
}

/// A subscriber's filter predicate (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    All,
    Campaign(Uuid),
}

impl Subscription {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Subscription::All => true,
            Subscription::Campaign(id) => event.campaign_id().map_or(true, |c| c == *id),
        }
    }
}
