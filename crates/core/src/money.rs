use rust_decimal::{Decimal, RoundingStrategy};

/// Standard French VAT rate, applied to the financed total in leasing
/// scenarios regardless of the per-line rates inside the quote.
pub const STANDARD_VAT_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Rounds a monetary amount to 2 decimal places, midpoint away from zero.
///
/// Every monetary field in the engine is stored at this precision. Aggregates
/// are sums of already-rounded line values, never a recomputation from
/// unrounded sub-totals, so line-level figures always add up to the totals
/// shown on the quote.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
