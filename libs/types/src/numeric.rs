//! Fixed-point decimal prices
//!
//! Uses rust_decimal so the random walk accumulates without binary
//! floating-point drift. State keeps full precision; values are rounded
//! HALF_UP only when a TickerUpdate is produced.

use rust_decimal::{Decimal, RoundingStrategy};

/// Price of a symbol in quote currency units.
pub type Price = Decimal;

/// Decimal places reported for prices and absolute changes.
pub const PRICE_DP: u32 = 2;

/// Decimal places reported for percent changes.
pub const PERCENT_DP: u32 = 3;

/// Default lower bound for any price: 0.01.
pub const DEFAULT_PRICE_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round a price or absolute change for reporting.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percent change for reporting.
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// `change / previous * 100`, or zero when there is no usable reference.
pub fn percent_change(previous: Price, change: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    change
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
