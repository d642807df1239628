use super::account::{Amount, FeeRate};

/// Derives the fee charged on `amount` at `rate`.
///
/// Exact decimal multiplication; no rounding beyond `Decimal`'s own precision.
pub fn compute_fee(amount: Amount, rate: FeeRate) -> Amount {
    amount.scaled_by(rate)
}
