//! Ticker records and the outbound wire envelope
//!
//! A `TickerUpdate` is produced fresh for every tick and every query; it is
//! never stored. One `FeedMessage::TickerBatch` is broadcast per tick:
//!
//! ```json
//! {"type": "ticker_batch", "data": [{"symbol": "AAPL", "price": 180.5, ...}]}
//! ```

use crate::ids::Symbol;
use crate::numeric::{percent_change, round_percent, round_price, Price};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time view of one symbol's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerUpdate {
    pub symbol: Symbol,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Price,
    #[serde(with = "rust_decimal::serde::float")]
    pub change: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_change: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl TickerUpdate {
    /// Update for a query with no previous reference: change fields are zero.
    pub fn at_rest(symbol: Symbol, price: Price, now: DateTime<Utc>) -> Self {
        Self {
            symbol,
            price: round_price(price),
            change: Decimal::ZERO,
            percent_change: Decimal::ZERO,
            last_updated: now,
        }
    }

    /// Update describing a move from `previous` to `current`.
    pub fn moved(symbol: Symbol, previous: Price, current: Price, now: DateTime<Utc>) -> Self {
        let change = current - previous;
        Self {
            symbol,
            price: round_price(current),
            change: round_price(change),
            percent_change: round_percent(percent_change(previous, change)),
            last_updated: now,
        }
    }
}

/// Messages pushed to streaming subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeedMessage {
    /// All per-symbol updates of one tick.
    TickerBatch(Vec<TickerUpdate>),
}

impl FeedMessage {
    /// Number of ticker entries carried.
    pub fn len(&self) -> usize {
        match self {
            FeedMessage::TickerBatch(updates) => updates.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
