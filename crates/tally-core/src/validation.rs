//! Input validation applied before any ledger mutation.
//!
//! Every function either returns the normalized value or a typed
//! [`ValidationError`]; nothing is silently clamped.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::currency::Currency;
use crate::error::ValidationError;

/// Default maximum length of a tracked name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Largest integer that survives a round trip through an IEEE double.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Trim, reject blanks and overlong input, and lowercase.
pub fn validate_name(raw: &str, max_len: usize) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::TooLong { max: max_len });
    }
    Ok(trimmed.to_lowercase())
}

/// Require an integer within `min..=max`.
pub fn validate_quantity(value: i64, min: i64, max: i64) -> Result<i64, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::out_of_range(min, max));
    }
    Ok(value)
}

/// Parse a user-typed quantity, distinguishing non-integers from range errors.
pub fn parse_quantity(raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    let value: Decimal = trimmed.parse().map_err(|_| ValidationError::NotInteger)?;
    if !value.fract().is_zero() {
        return Err(ValidationError::NotInteger);
    }
    let value = value
        .to_i64()
        .ok_or_else(|| ValidationError::out_of_range(min, max))?;
    validate_quantity(value, min, max)
}

/// Require one of the five D&D denominations (names or abbreviations).
pub fn validate_currency(raw: &str) -> Result<Currency, ValidationError> {
    raw.parse()
}

/// Require a fee rate within `0..=1`.
pub fn validate_fee_rate(value: Decimal) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::out_of_range(0, 1));
    }
    Ok(value.normalize())
}

/// Require a positive decimal amount and convert it to whole hundredths.
///
/// Amounts are rounded half away from zero to two places first; anything that
/// rounds to zero is rejected.
pub fn validate_decimal_amount(value: Decimal) -> Result<i64, ValidationError> {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let max = Decimal::new(MAX_SAFE_INTEGER, 2);
    if rounded <= Decimal::ZERO || rounded > max {
        return Err(ValidationError::out_of_range("0.01", max));
    }
    (rounded * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| ValidationError::out_of_range("0.01", max))
}

/// Trim and lowercase a search term, requiring at least `min_len` characters.
pub fn validate_search_term(
    raw: &str,
    min_len: usize,
    max_len: usize,
) -> Result<String, ValidationError> {
    let term = validate_name(raw, max_len)?;
    if term.chars().count() < min_len {
        return Err(ValidationError::out_of_range(
            format!("{} characters", min_len),
            format!("{} characters", max_len),
        ));
    }
    Ok(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_normalizes() {
        assert_eq!(validate_name("  Arrows ", MAX_NAME_LENGTH).unwrap(), "arrows");
    }

    #[test]
    fn test_validate_name_rejects_blank_and_long() {
        assert_eq!(validate_name("   ", MAX_NAME_LENGTH), Err(ValidationError::EmptyInput));
        let long = "x".repeat(101);
        assert_eq!(
            validate_name(&long, MAX_NAME_LENGTH),
            Err(ValidationError::TooLong { max: 100 })
        );
        assert!(validate_name(&"x".repeat(100), MAX_NAME_LENGTH).is_ok());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert_eq!(validate_quantity(1, 1, MAX_SAFE_INTEGER), Ok(1));
        assert!(validate_quantity(0, 1, MAX_SAFE_INTEGER).is_err());
        assert!(validate_quantity(-5, 1, MAX_SAFE_INTEGER).is_err());
        assert!(validate_quantity(MAX_SAFE_INTEGER + 1, 1, MAX_SAFE_INTEGER).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("42", 1, 100), Ok(42));
        assert_eq!(parse_quantity("4.5", 1, 100), Err(ValidationError::NotInteger));
        assert_eq!(parse_quantity("many", 1, 100), Err(ValidationError::NotInteger));
        assert_eq!(
            parse_quantity("101", 1, 100),
            Err(ValidationError::out_of_range(1, 100))
        );
    }

    #[test]
    fn test_validate_currency() {
        assert_eq!(validate_currency(" Gold "), Ok(Currency::Gold));
        assert_eq!(validate_currency("cp"), Ok(Currency::Copper));
        assert!(matches!(
            validate_currency("yen"),
            Err(ValidationError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_validate_fee_rate() {
        assert_eq!(validate_fee_rate(Decimal::ZERO), Ok(Decimal::ZERO));
        assert_eq!(validate_fee_rate(Decimal::ONE), Ok(Decimal::ONE));
        assert_eq!(validate_fee_rate(Decimal::new(250, 3)), Ok(Decimal::new(25, 2)));
        assert!(validate_fee_rate(Decimal::new(-1, 2)).is_err());
        assert!(validate_fee_rate(Decimal::new(101, 2)).is_err());
    }

    #[test]
    fn test_validate_decimal_amount() {
        assert_eq!(validate_decimal_amount(Decimal::new(1050, 2)), Ok(1050));
        assert_eq!(validate_decimal_amount(Decimal::new(12345, 3)), Ok(1235));
        assert!(validate_decimal_amount(Decimal::ZERO).is_err());
        assert!(validate_decimal_amount(Decimal::new(4, 3)).is_err());
        assert!(validate_decimal_amount(Decimal::new(-5, 0)).is_err());
    }

    #[test]
    fn test_validate_search_term() {
        assert_eq!(validate_search_term(" Ar ", 2, 100).unwrap(), "ar");
        assert!(validate_search_term("a", 2, 100).is_err());
    }
}
