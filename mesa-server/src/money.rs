//! Money calculation utilities using rust_decimal for precision
//!
//! 金额运算一律走 `Decimal`，`f64` 只出现在存储和序列化边界。
//! 直接用 f64 累加会把浮点误差带进顾客账单（0.10 × 3 =
//! 0.30000000000000004）。

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
///
/// Inputs are validated finite at the API boundary; a non-finite value
/// reaching this point is logged and zeroed rather than poisoning the
/// bill.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // Decimal rounded to 2dp is always representable as f64
        .expect("rounded Decimal fits in f64")
}

/// Line total: unit price × quantity, rounded to cents
#[inline]
pub fn item_total(price: f64, quantity: i32) -> Decimal {
    (to_decimal(price) * Decimal::from(quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum stored amounts without accumulating float error
pub fn sum(amounts: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum::<Decimal>())
}
