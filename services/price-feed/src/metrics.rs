//! Observability counters for the price feed
//!
//! Tracks ticks, broadcast fan-out results, per-symbol step faults,
//! registry churn and fan-out latency. Counters are lock-free; only the
//! latency window sits behind a mutex.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::sync::lock;

/// Core metrics for the price feed.
pub struct FeedMetrics {
    // Ticking
    pub ticks: AtomicU64,
    pub symbol_faults: AtomicU64,
    pub cycle_panics: AtomicU64,

    // Broadcasting
    pub batches_broadcast: AtomicU64,
    pub deliveries: AtomicU64,
    pub delivery_failures: AtomicU64,
    pub broadcast_latency_us: Mutex<LatencyTracker>,

    // Registry
    pub subscribers_registered: AtomicU64,
    pub subscribers_removed: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            symbol_faults: AtomicU64::new(0),
            cycle_panics: AtomicU64::new(0),
            batches_broadcast: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            broadcast_latency_us: Mutex::new(LatencyTracker::new(1000)),
            subscribers_registered: AtomicU64::new(0),
            subscribers_removed: AtomicU64::new(0),
        }
    }

    /// Record a completed tick and the symbol faults it hit.
    pub fn record_tick(&self, faults: u64) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.symbol_faults.fetch_add(faults, Ordering::Relaxed);
    }

    /// Record a panic caught inside one ticker cycle.
    pub fn record_cycle_panic(&self) {
        self.cycle_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one fan-out.
    pub fn record_broadcast(&self, delivered: u64, failed: u64, latency_us: u64) {
        self.batches_broadcast.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.delivery_failures.fetch_add(failed, Ordering::Relaxed);
        lock(&self.broadcast_latency_us).record(latency_us);
    }

    pub fn record_registered(&self) {
        self.subscribers_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removed(&self) {
        self.subscribers_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (p50, p99) = {
            let tracker = lock(&self.broadcast_latency_us);
            (tracker.percentile(50), tracker.percentile(99))
        };
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            symbol_faults: self.symbol_faults.load(Ordering::Relaxed),
            cycle_panics: self.cycle_panics.load(Ordering::Relaxed),
            batches_broadcast: self.batches_broadcast.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            subscribers_registered: self.subscribers_registered.load(Ordering::Relaxed),
            subscribers_removed: self.subscribers_removed.load(Ordering::Relaxed),
            broadcast_latency_p50_us: p50,
            broadcast_latency_p99_us: p99,
        }
    }
}

impl Default for FeedMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of [`FeedMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub symbol_faults: u64,
    pub cycle_panics: u64,
    pub batches_broadcast: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
    pub subscribers_registered: u64,
    pub subscribers_removed: u64,
    pub broadcast_latency_p50_us: Option<u64>,
    pub broadcast_latency_p99_us: Option<u64>,
}

/// Tracks latency samples for percentile calculation.
pub struct LatencyTracker {
    samples: VecDeque<u64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a latency sample, evicting the oldest when full.
    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Get a percentile value (0-100).
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (p as f64 / 100.0 * (sorted.len() - 1) as f64) as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    /// Number of samples recorded.
    pub fn count(&self) -> usize {
        self.samples.len()
    }
}
