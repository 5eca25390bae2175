//! Ticker service facade
//!
//! Single entry point for the HTTP and streaming handlers. Built once at
//! process start and shared as `Arc<TickerService>`; every external read or
//! write of prices and membership goes through here.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::info;
use types::errors::FeedError;
use types::ids::SubscriberId;
use types::ticker::TickerUpdate;

use crate::broadcast::{BroadcastOutcome, Broadcaster};
use crate::config::FeedConfig;
use crate::metrics::{FeedMetrics, MetricsSnapshot};
use crate::registry::{ConnectionRegistry, Registration, Subscriber};
use crate::store::PriceStore;
use crate::sync::lock;
use crate::tick::{PriceShock, TickGenerator, UniformShock};
use crate::ticker_loop::{TickCycle, TickerLoop};

/// Price store, subscriber registry and ticker loop behind one handle.
pub struct TickerService {
    prices: Arc<Mutex<PriceStore>>,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<FeedMetrics>,
    ticker: TickerLoop,
}

impl TickerService {
    /// Build a service whose random walk is seeded from `config.seed`, or
    /// from entropy when no seed is set.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let shock: Box<dyn PriceShock> = match config.seed {
            Some(seed) => Box::new(UniformShock::seeded(config.max_step, seed)?),
            None => Box::new(UniformShock::from_entropy(config.max_step)?),
        };
        Self::with_shock(config, shock)
    }

    /// Build a service driven by a caller-supplied shock source.
    pub fn with_shock(config: FeedConfig, shock: Box<dyn PriceShock>) -> Result<Self, FeedError> {
        config.validate()?;
        let initial = config.initial_prices()?;
        let symbols = initial.len();

        let metrics = Arc::new(FeedMetrics::new());
        let prices = Arc::new(Mutex::new(PriceStore::new(initial)));
        let registry = Arc::new(ConnectionRegistry::new(Arc::clone(&metrics)));
        let cycle = TickCycle {
            prices: Arc::clone(&prices),
            generator: Arc::new(Mutex::new(TickGenerator::new(shock, config.price_floor))),
            registry: Arc::clone(&registry),
            broadcaster: Arc::new(Broadcaster::new(Arc::clone(&metrics))),
            metrics: Arc::clone(&metrics),
        };

        info!(
            symbols,
            tick_interval_ms = config.tick_interval.as_millis() as u64,
            max_step = config.max_step,
            "Ticker service initialized"
        );

        Ok(Self {
            prices,
            registry,
            metrics,
            ticker: TickerLoop::new(config.tick_interval, cycle),
        })
    }

    /// Add a live subscriber; membership ends when the guard is dropped.
    ///
    /// Returns `None` if a subscriber with the same id is already live.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> Option<Registration> {
        self.registry.register(subscriber)
    }

    /// Remove a subscriber now. Unknown ids are ignored.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        self.registry.remove(id)
    }

    pub fn is_registered(&self, id: &SubscriberId) -> bool {
        self.registry.contains(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Ids of the currently registered subscribers.
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.registry.ids()
    }

    /// Current price of every symbol, change fields zero.
    pub fn snapshot(&self) -> Vec<TickerUpdate> {
        lock(&self.prices).snapshot(Utc::now())
    }

    /// Current price of one symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Result<TickerUpdate, FeedError> {
        lock(&self.prices).get(symbol, Utc::now())
    }

    /// Restore one symbol to its configured baseline.
    pub fn reset(&self, symbol: &str) -> Result<TickerUpdate, FeedError> {
        let update = lock(&self.prices).reset(symbol, Utc::now())?;
        info!(symbol = %update.symbol, price = %update.price, "Symbol reset to baseline");
        Ok(update)
    }

    /// Start the background ticker. Idempotent.
    pub async fn start(&self) -> bool {
        self.ticker.start().await
    }

    /// Stop the background ticker and wait for it to exit.
    pub async fn stop(&self) -> bool {
        self.ticker.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.ticker.is_running().await
    }

    /// Run one tick and broadcast immediately.
    pub async fn tick_once(&self) -> BroadcastOutcome {
        self.ticker.tick_once().await
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.period()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
