//! Quantity rules for the inventory ledger
//!
//! Every quantity that reaches the ledger is a fixed-point decimal with
//! [`QUANTITY_SCALE`] fractional digits, the precision of the `NUMERIC(18,3)`
//! column it is stored in.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Fractional digits kept on every stored quantity
pub const QUANTITY_SCALE: u32 = 3;

/// Largest integer part a stored quantity may have (15 digits)
const MAX_INTEGER_DIGITS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is required")]
    Missing,

    #[error("quantity must not be zero")]
    Zero,

    #[error("quantity exceeds the storable range")]
    OutOfRange,
}

/// Round a quantity to the stored precision, half away from zero
pub fn normalize_quantity(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a required quantity: present, non-zero once normalised and
/// within the storage column. Sign is not constrained.
pub fn require_quantity(quantity: Option<Decimal>) -> Result<Decimal, QuantityError> {
    let quantity = normalize_quantity(quantity.ok_or(QuantityError::Missing)?);
    if quantity.is_zero() {
        return Err(QuantityError::Zero);
    }
    check_storable(quantity)?;
    Ok(quantity)
}

/// Check that a quantity fits the storage column
pub fn check_storable(quantity: Decimal) -> Result<(), QuantityError> {
    let limit = Decimal::from(10i64.pow(MAX_INTEGER_DIGITS));
    if quantity.abs() >= limit {
        return Err(QuantityError::OutOfRange);
    }
    Ok(())
}
