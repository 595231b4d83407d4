use crate::events::{Event, Subscription};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Publish/subscribe progress hub (§4.10). Wraps one process-wide
/// `broadcast::Sender<Event>` the way the teacher's own event bus wraps
/// one; per-subscriber filtering happens client-side of the channel so
/// every subscriber sees every event and discards what it didn't ask for.
pub struct Broadcaster {
    sender: broadcast::Sender<Event>,
    /// Per-campaign monotone sequence counters (§5 ordering guarantee).
    sequence_counters: DashMap<Uuid, AtomicU64>,
    global_sequence: AtomicU64,
}

impl Broadcaster {
    pub fn new(subscriber_buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(subscriber_buffer_size);
        Broadcaster { sender, sequence_counters: DashMap::new(), global_sequence: AtomicU64::new(0) }
    }

    fn next_sequence(&self, campaign_id: Option<Uuid>) -> u64 {
        match campaign_id {
            Some(id) => self
                .sequence_counters
                .entry(id)
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(1, Ordering::Relaxed),
            None => self.global_sequence.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Publish never blocks and never fails on the caller's behalf: with
    /// no subscribers, `broadcast::Sender::send` returning an error just
    /// means nobody was listening (§4.10 failure semantics).
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub fn campaign_progress(
        &self,
        campaign_id: Uuid,
        total: i64,
        processed: i64,
        successful: i64,
        failed: i64,
    ) {
        let sequence_number = self.next_sequence(Some(campaign_id));
        let progress = processed as f64 / total.max(1) as f64;
        self.publish(Event::CampaignProgress {
            campaign_id,
            total,
            processed,
            successful,
            failed,
            progress,
            sequence_number,
        });
    }

    pub fn campaign_complete(
        &self,
        campaign_id: Uuid,
        status: domainflow_core::CampaignStatus,
        total: i64,
        successful: i64,
        failed: i64,
    ) {
        let sequence_number = self.next_sequence(Some(campaign_id));
        self.publish(Event::CampaignComplete { campaign_id, status, total, successful, failed, sequence_number });
    }

    pub fn domain_generated(&self, campaign_id: Uuid, domain: String, offset_index: i64) {
        let sequence_number = self.next_sequence(Some(campaign_id));
        self.publish(Event::DomainGenerated { campaign_id, domain, offset_index, sequence_number });
    }

    pub fn validation_result(&self, campaign_id: Uuid, domain: String, status: String, details: serde_json::Value) {
        let sequence_number = self.next_sequence(Some(campaign_id));
        self.publish(Event::ValidationResult { campaign_id, domain, status, details, sequence_number });
    }

    pub fn proxy_status_update(&self, proxy_id: Uuid, healthy: bool, latency_ms: Option<i64>) {
        let sequence_number = self.next_sequence(None);
        self.publish(Event::ProxyStatusUpdate { proxy_id, healthy, latency_ms, sequence_number });
    }

    pub fn system_notification(&self, level: impl Into<String>, message: impl Into<String>) {
        let sequence_number = self.next_sequence(None);
        self.publish(Event::SystemNotification { level: level.into(), message: message.into(), sequence_number });
    }

    /// Register a subscriber under `predicate`. Unsubscription is simply
    /// dropping the returned [`Subscriber`] — idempotent since dropping an
    /// already-dropped receiver is a no-op (§4.10).
    pub fn subscribe(self: &Arc<Self>, predicate: Subscription) -> Subscriber {
        Subscriber { receiver: self.sender.subscribe(), predicate }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One subscriber's handle. Bounded by the broadcast channel's ring
/// buffer; a subscriber that falls more than `subscriber_buffer_size`
/// events behind receives a synthetic [`Event::Dropped`] marker in place
/// of whatever it missed, rather than silently losing them (§4.10).
pub struct Subscriber {
    receiver: broadcast::Receiver<Event>,
    predicate: Subscription,
}

impl Subscriber {
    /// Await the next event matching this subscriber's predicate. Returns
    /// `None` once the broadcaster itself has been dropped and the
    /// channel is permanently closed.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.predicate.matches(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    return Some(Event::Dropped { count, sequence_number: 0 });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_only_sees_its_own_campaign() {
        let broadcaster = Arc::new(Broadcaster::new(16));
        let campaign_a = Uuid::new_v4();
        let campaign_b = Uuid::new_v4();
        let mut sub = broadcaster.subscribe(Subscription::Campaign(campaign_a));

        broadcaster.domain_generated(campaign_b, "b.example.com".into(), 0);
        broadcaster.domain_generated(campaign_a, "a.example.com".into(), 0);

        let event = sub.recv().await.expect("event delivered");
        match event {
            Event::DomainGenerated { campaign_id, domain, .. } => {
                assert_eq!(campaign_id, campaign_a);
                assert_eq!(domain, "a.example.com");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sequence_numbers_are_monotone_per_campaign() {
        let broadcaster = Arc::new(Broadcaster::new(16));
        let campaign_id = Uuid::new_v4();
        let mut sub = broadcaster.subscribe(Subscription::All);

        broadcaster.campaign_progress(campaign_id, 10, 1, 1, 0);
        broadcaster.campaign_progress(campaign_id, 10, 2, 2, 0);

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        let seq = |e: &Event| match e {
            Event::CampaignProgress { sequence_number, .. } => *sequence_number,
            _ => panic!("expected campaign_progress"),
        };
        assert!(seq(&second) > seq(&first));
    }

    #[tokio::test]
    async fn lagging_subscriber_gets_a_drop_marker() {
        let broadcaster = Arc::new(Broadcaster::new(2));
        let campaign_id = Uuid::new_v4();
        let mut sub = broadcaster.subscribe(Subscription::All);

        for i in 0..5 {
            broadcaster.domain_generated(campaign_id, format!("d{i}.example.com"), i);
        }

        let event = sub.recv().await.expect("event delivered");
        assert!(matches!(event, Event::Dropped { .. }));
    }
}
