//! Money arithmetic helpers.
//!
//! Prices are `rust_decimal::Decimal` end to end. Intermediate math keeps full
//! precision; [`round_money`] is applied once, at presentation/settlement
//! boundaries, never mid-computation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half-up, and pin the scale to 2 so the value
/// formats as `80.00` rather than `80`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `amount * percent / 100`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}
