//! Price Feed Service
//!
//! In-memory price store mutated on a fixed interval and fanned out to an
//! open set of live subscribers:
//! - Price store with immutable baselines for reset
//! - Random-walk tick generation with an injectable shock source
//! - Connection registry with drop-guard registrations
//! - Concurrent, failure-tolerant batch broadcasting
//! - Restartable background ticker loop
//!
//! # Architecture
//!
//! ```text
//!   TickerLoop (every tick_interval)
//!        │
//!   ┌────▼─────────┐     ┌────────────┐
//!   │TickGenerator │────▶│ PriceStore │
//!   └────┬─────────┘     └────────────┘
//!        │ batch
//!   ┌────▼────────┐  snapshot  ┌────────────────────┐
//!   │ Broadcaster │◀───────────│ ConnectionRegistry │
//!   └────┬────────┘            └────────────────────┘
//!        │
//!   subscribers (one envelope each)
//! ```
//!
//! [`TickerService`] is the single entry point used by the gateway.

pub mod broadcast;
pub mod config;
pub mod metrics;
pub mod registry;
pub mod service;
pub mod store;
pub mod tick;
pub mod ticker_loop;

mod sync;

pub use broadcast::{BroadcastOutcome, Broadcaster};
pub use config::FeedConfig;
pub use registry::{ConnectionRegistry, Registration, Subscriber};
pub use service::TickerService;
pub use tick::{ConstantShock, PriceShock, TickGenerator, UniformShock};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
