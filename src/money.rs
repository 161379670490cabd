//! Monetary helpers shared by the ledger, settlement, and pricing services.
//!
//! All amounts are ouguiya (MRU) held as [`Decimal`]. The business books
//! whole ouguiya only, so every stored or summed amount passes through
//! [`round_mru`] first.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to whole ouguiya. Midpoints round away from zero.
pub fn round_mru(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Treats an absent amount as zero. Financial fields on an order snapshot
/// are optional; arithmetic coerces rather than rejects.
pub fn or_zero(amount: Option<Decimal>) -> Decimal {
    amount.unwrap_or(Decimal::ZERO)
}
