//! Money helpers using rust_decimal for precision
//!
//! Amounts are stored as `f64`. Sums go through `Decimal` so they carry no
//! float drift and are never rounded; averages come back rounded to 2 decimal
//! places. An amount `Decimal` cannot hold makes the whole fold fall back to
//! plain `f64` arithmetic rather than dropping it.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation; `None` for NaN, infinities and
/// magnitudes beyond the Decimal range
#[inline]
pub fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> Option<f64> {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

fn exact_sum(amounts: &[f64]) -> Option<Decimal> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(to_decimal(*amount)?))
}

/// Sum of amounts
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let amounts: Vec<f64> = amounts.into_iter().collect();
    exact_sum(&amounts)
        .and_then(|total| total.to_f64())
        .unwrap_or_else(|| amounts.iter().sum())
}

/// Mean of amounts; zero when there are none
pub fn average<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let amounts: Vec<f64> = amounts.into_iter().collect();
    if amounts.is_empty() {
        return 0.0;
    }
    let count = amounts.len();
    exact_sum(&amounts)
        .and_then(|total| total.checked_div(Decimal::from(count as u64)))
        .and_then(to_f64)
        .unwrap_or_else(|| amounts.iter().sum::<f64>() / count as f64)
}
