//! Fixed-point money helpers
//!
//! All amounts are [`rust_decimal::Decimal`]; nothing in the billing path touches
//! floating point.

use crate::domain::{HospitalError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept on every stored amount
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to cents, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Zero with money scale (`0.00`)
pub fn zero() -> Decimal {
    Decimal::new(0, MONEY_SCALE)
}

/// Rejects negative prices and costs
pub fn ensure_non_negative(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(HospitalError::Validation(format!(
            "{field} must not be negative, got {amount}"
        )));
    }
    Ok(round_money(amount))
}

/// Validates an ISO 4217 style currency code (three uppercase letters)
pub fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(HospitalError::Validation(format!(
            "currency must be a three-letter code, got '{code}'"
        )));
    }
    Ok(code)
}
