//! Random-walk tick generation
//!
//! Each tick moves every symbol independently by a draw from a
//! [`PriceShock`], floors the result and reports the move. A symbol whose
//! step cannot be computed keeps its price for that tick; the rest of the
//! batch is unaffected.

use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use tracing::warn;
use types::errors::FeedError;
use types::ids::Symbol;
use types::numeric::Price;
use types::ticker::TickerUpdate;

use crate::config::validate_max_step;
use crate::store::PriceStore;

/// Source of per-symbol price perturbations.
pub trait PriceShock: Send {
    /// Next additive step for `symbol`, in price units.
    fn draw(&mut self, symbol: &Symbol) -> f64;
}

/// Uniform draws in `[-max_step, +max_step]`.
pub struct UniformShock {
    step: Uniform<f64>,
    rng: ChaCha8Rng,
}

impl UniformShock {
    /// Reproducible walk from a fixed seed.
    pub fn seeded(max_step: f64, seed: u64) -> Result<Self, FeedError> {
        Self::with_rng(max_step, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy(max_step: f64) -> Result<Self, FeedError> {
        Self::with_rng(max_step, ChaCha8Rng::from_entropy())
    }

    fn with_rng(max_step: f64, rng: ChaCha8Rng) -> Result<Self, FeedError> {
        validate_max_step(max_step)?;
        Ok(Self {
            step: Uniform::new_inclusive(-max_step, max_step),
            rng,
        })
    }
}

impl PriceShock for UniformShock {
    fn draw(&mut self, _symbol: &Symbol) -> f64 {
        self.step.sample(&mut self.rng)
    }
}

/// The same step for every symbol on every tick.
#[derive(Debug, Clone, Copy)]
pub struct ConstantShock(pub f64);

impl PriceShock for ConstantShock {
    fn draw(&mut self, _symbol: &Symbol) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StepFault {
    NonFinite(f64),
    Overflow,
}

/// Applies one random-walk step to a [`PriceStore`].
pub struct TickGenerator {
    shock: Box<dyn PriceShock>,
    floor: Price,
    faults: u64,
}

impl TickGenerator {
    pub fn new(shock: Box<dyn PriceShock>, floor: Price) -> Self {
        Self {
            shock,
            floor,
            faults: 0,
        }
    }

    /// Symbol steps skipped since creation.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    /// Move every symbol once and return the batch, in symbol order.
    pub fn tick(&mut self, store: &mut PriceStore, now: DateTime<Utc>) -> Vec<TickerUpdate> {
        let mut batch = Vec::with_capacity(store.len());

        for (symbol, price) in store.prices_mut() {
            let previous = *price;
            let delta = self.shock.draw(symbol);
            match step(previous, delta, self.floor) {
                Ok(next) => {
                    *price = next;
                    batch.push(TickerUpdate::moved(symbol.clone(), previous, next, now));
                }
                Err(fault) => {
                    self.faults += 1;
                    warn!(%symbol, ?fault, "Skipping price step; symbol keeps its price");
                    batch.push(TickerUpdate::at_rest(symbol.clone(), previous, now));
                }
            }
        }

        batch
    }
}

fn step(previous: Price, delta: f64, floor: Price) -> Result<Price, StepFault> {
    if !delta.is_finite() {
        return Err(StepFault::NonFinite(delta));
    }
    let delta = Decimal::from_f64(delta).ok_or(StepFault::Overflow)?;
    let candidate = previous.checked_add(delta).ok_or(StepFault::Overflow)?;
    Ok(candidate.max(floor))
}
