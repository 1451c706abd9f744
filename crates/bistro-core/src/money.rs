//! Currency formatting helpers
//!
//! Amounts stay at full precision through every aggregation; rounding to two
//! decimal places happens only here, at the presentation boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest unit price, line total or order total accepted into the store
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// Sum amounts, saturating at `Decimal::MAX` instead of overflowing
///
/// Stored amounts are capped by [`max_amount`]; this keeps hand-built order
/// slices from aborting a report.
pub fn sum_amounts<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Round a currency amount to 2 decimal places (half away from zero)
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as `{symbol}{amount:.2}`, e.g. `₹1234.50`
pub fn format_money(symbol: &str, amount: Decimal) -> String {
    format!("{}{:.2}", symbol, round_currency(amount))
}

/// Format a ratio in `[0, 1]` as a percentage with one decimal, e.g. `50.0%`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
