//! Configuration for the price feed.

use std::collections::BTreeMap;
use std::time::Duration;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use types::errors::FeedError;
use types::ids::Symbol;
use types::numeric::{Price, DEFAULT_PRICE_FLOOR};

/// Configuration for the price engine and its ticker loop.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Configured symbols and their baseline prices.
    pub symbols: Vec<(String, Price)>,
    /// Period between ticks (default: 2s).
    pub tick_interval: Duration,
    /// Largest absolute random step per tick (default: 1.0).
    pub max_step: f64,
    /// Prices never go below this value (default: 0.01).
    pub price_floor: Price,
    /// Seed for a reproducible random walk; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbols: vec![
                ("AAPL".to_string(), Decimal::new(18000, 2)),
                ("GOOG".to_string(), Decimal::new(14500, 2)),
                ("MSFT".to_string(), Decimal::new(38000, 2)),
                ("AMZN".to_string(), Decimal::new(14500, 2)),
            ],
            tick_interval: Duration::from_secs(2),
            max_step: 1.0,
            price_floor: DEFAULT_PRICE_FLOOR,
            seed: None,
        }
    }
}

impl FeedConfig {
    /// Check every field; returns the first problem found.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.tick_interval.is_zero() {
            return Err(FeedError::invalid_config("tick_interval must be positive"));
        }
        validate_max_step(self.max_step)?;
        if self.price_floor <= Decimal::ZERO {
            return Err(FeedError::invalid_config("price_floor must be positive"));
        }
        self.initial_prices().map(|_| ())
    }

    /// Normalized baseline prices keyed by symbol.
    pub fn initial_prices(&self) -> Result<BTreeMap<Symbol, Price>, FeedError> {
        if self.symbols.is_empty() {
            return Err(FeedError::invalid_config("no symbols configured"));
        }

        let mut prices = BTreeMap::new();
        for (raw, price) in &self.symbols {
            let symbol = Symbol::try_new(raw)
                .ok_or_else(|| FeedError::invalid_config(format!("invalid symbol {raw:?}")))?;
            if *price < self.price_floor {
                return Err(FeedError::invalid_config(format!(
                    "initial price {price} for {symbol} is below the floor {}",
                    self.price_floor
                )));
            }
            if prices.insert(symbol.clone(), *price).is_some() {
                return Err(FeedError::invalid_config(format!("duplicate symbol {symbol}")));
            }
        }
        Ok(prices)
    }
}

/// A step bound is usable when it is non-negative, the draw range
/// `[-max_step, max_step]` has a finite width, and every draw converts to a
/// `Decimal`.
pub(crate) fn validate_max_step(max_step: f64) -> Result<(), FeedError> {
    let usable = max_step.is_finite()
        && max_step >= 0.0
        && (2.0 * max_step).is_finite()
        && Decimal::from_f64(max_step).is_some()
        && Decimal::from_f64(-max_step).is_some();
    if usable {
        Ok(())
    } else {
        Err(FeedError::invalid_config(format!(
            "max_step must be a non-negative number within the decimal price range, got {max_step}"
        )))
    }
}
