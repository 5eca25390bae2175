//! In-memory price store
//!
//! Holds the current price of every configured symbol plus the baseline it
//! started from. The symbol set is fixed at construction. No locking here:
//! the service keeps the store behind a mutex and scopes the guard to each
//! call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use types::errors::FeedError;
use types::ids::Symbol;
use types::numeric::Price;
use types::ticker::TickerUpdate;

/// Current and baseline prices per symbol.
///
/// Uses BTreeMap so snapshots and tick batches come out in symbol order.
#[derive(Debug, Clone)]
pub struct PriceStore {
    current: BTreeMap<Symbol, Price>,
    initial: BTreeMap<Symbol, Price>,
}

impl PriceStore {
    /// Create a store whose current prices start at the baselines.
    pub fn new(initial: BTreeMap<Symbol, Price>) -> Self {
        Self {
            current: initial.clone(),
            initial,
        }
    }

    /// Number of configured symbols.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Configured symbols in order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.current.keys()
    }

    /// Current unrounded price of a symbol.
    pub fn price(&self, symbol: &Symbol) -> Option<Price> {
        self.current.get(symbol).copied()
    }

    /// Baseline price of a symbol.
    pub fn initial_price(&self, symbol: &Symbol) -> Option<Price> {
        self.initial.get(symbol).copied()
    }

    /// One at-rest update per symbol; does not mutate.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<TickerUpdate> {
        self.current
            .iter()
            .map(|(symbol, price)| TickerUpdate::at_rest(symbol.clone(), *price, now))
            .collect()
    }

    /// Case-insensitive lookup of one symbol; does not mutate.
    pub fn get(&self, symbol: &str, now: DateTime<Utc>) -> Result<TickerUpdate, FeedError> {
        let key = Self::resolve(symbol)?;
        let price = self
            .current
            .get(&key)
            .ok_or_else(|| FeedError::unknown_symbol(symbol))?;
        Ok(TickerUpdate::at_rest(key, *price, now))
    }

    /// Restore one symbol to its baseline.
    ///
    /// Unknown symbols leave the store untouched.
    pub fn reset(&mut self, symbol: &str, now: DateTime<Utc>) -> Result<TickerUpdate, FeedError> {
        let key = Self::resolve(symbol)?;
        let baseline = self
            .initial
            .get(&key)
            .copied()
            .ok_or_else(|| FeedError::unknown_symbol(symbol))?;
        if let Some(price) = self.current.get_mut(&key) {
            *price = baseline;
        }
        Ok(TickerUpdate::at_rest(key, baseline, now))
    }

    /// Mutable access to every current price, for the tick generator.
    pub(crate) fn prices_mut(&mut self) -> impl Iterator<Item = (&Symbol, &mut Price)> {
        self.current.iter_mut()
    }

    fn resolve(symbol: &str) -> Result<Symbol, FeedError> {
        Symbol::try_new(symbol).ok_or_else(|| FeedError::unknown_symbol(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn store() -> PriceStore {
        let mut prices = BTreeMap::new();
        prices.insert(Symbol::new("AAPL"), Decimal::new(18000, 2));
        prices.insert(Symbol::new("MSFT"), Decimal::new(38000, 2));
        PriceStore::new(prices)
    }

    #[test]
    fn test_snapshot_one_entry_per_symbol() {
        let store = store();
        let now = Utc::now();
        let snapshot = store.snapshot(now);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].symbol.as_str(), "AAPL");
        assert_eq!(snapshot[1].symbol.as_str(), "MSFT");
        assert!(snapshot.iter().all(|u| u.change.is_zero() && u.last_updated == now));
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let store = store();
        let update = store.get("aapl", Utc::now()).unwrap();
        assert_eq!(update.symbol.as_str(), "AAPL");
        assert_eq!(update.price, Decimal::new(18000, 2));
    }

    #[test]
    fn test_get_unknown_symbol() {
        let store = store();
        assert_eq!(
            store.get("TSLA", Utc::now()),
            Err(FeedError::unknown_symbol("TSLA"))
        );
        assert!(store.get("not a symbol", Utc::now()).is_err());
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut store = store();
        for (_, price) in store.prices_mut() {
            *price += Decimal::new(1234, 2);
        }

        let update = store.reset("Aapl", Utc::now()).unwrap();
        assert_eq!(update.price, Decimal::new(18000, 2));
        assert!(update.change.is_zero());
        assert_eq!(store.price(&Symbol::new("AAPL")), Some(Decimal::new(18000, 2)));
        // Only the reset symbol moves back.
        assert_eq!(store.price(&Symbol::new("MSFT")), Some(Decimal::new(39234, 2)));
    }

    #[test]
    fn test_reset_unknown_symbol_does_not_mutate() {
        let mut store = store();
        let before = store.snapshot(Utc::now());
        let now = before[0].last_updated;

        assert!(matches!(
            store.reset("TSLA", now),
            Err(FeedError::UnknownSymbol { .. })
        ));
        assert_eq!(store.snapshot(now), before);
    }
}
