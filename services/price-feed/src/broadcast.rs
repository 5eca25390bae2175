//! Batch fan-out to subscribers
//!
//! One tick produces one envelope, serialized once and shared by every
//! delivery. Deliveries run concurrently; a failing subscriber is counted
//! and skipped, never retried and never unregistered here. Its own
//! connection task sees the disconnect and drops its registration.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error};
use types::ticker::{FeedMessage, TickerUpdate};

use crate::metrics::FeedMetrics;
use crate::registry::Subscriber;

/// Result of delivering one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastOutcome {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Delivers ticker batches to a snapshot of subscribers.
pub struct Broadcaster {
    metrics: Arc<FeedMetrics>,
}

impl Broadcaster {
    pub fn new(metrics: Arc<FeedMetrics>) -> Self {
        Self { metrics }
    }

    /// Push `batch` to every subscriber in `subscribers`.
    ///
    /// An empty batch or an empty snapshot does nothing.
    pub async fn broadcast(
        &self,
        batch: Vec<TickerUpdate>,
        subscribers: Vec<Arc<dyn Subscriber>>,
    ) -> BroadcastOutcome {
        if batch.is_empty() || subscribers.is_empty() {
            return BroadcastOutcome::default();
        }

        let message = FeedMessage::TickerBatch(batch);
        let payload: Arc<str> = match serde_json::to_string(&message) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(error = %e, "Failed to serialize ticker batch");
                return BroadcastOutcome::default();
            }
        };

        let started = Instant::now();
        let results = join_all(subscribers.iter().map(|subscriber| {
            let payload = Arc::clone(&payload);
            async move { (subscriber.id(), subscriber.send_json(payload).await) }
        }))
        .await;

        let mut outcome = BroadcastOutcome::default();
        for (subscriber_id, result) in results {
            match result {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed += 1;
                    debug!(%subscriber_id, error = %e, "Delivery failed");
                }
            }
        }

        self.metrics.record_broadcast(
            outcome.delivered as u64,
            outcome.failed as u64,
            started.elapsed().as_micros() as u64,
        );
        debug!(
            entries = message.len(),
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Broadcast ticker batch"
        );

        outcome
    }
}
