//! Type-safe price representation using decimal arithmetic.
//!
//! Prices come from the shop backend as either JSON numbers or numeric
//! strings. They carry no currency: the storefront renders a single,
//! configured currency label next to every amount.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// An arithmetic result does not fit in a decimal.
    #[error("price out of range")]
    Overflow,
}

/// A monetary amount.
///
/// Arithmetic is exact and checked; rounding only happens when formatting
/// for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest unit price accepted from a visitor's form.
    pub const MAX_UNIT: Self = Self(Decimal::from_parts(1_000_000, 0, 0, false, 0));

    /// Whether this amount is usable as a unit price: not negative and at
    /// most [`Price::MAX_UNIT`].
    #[must_use]
    pub fn is_valid_unit(&self) -> bool {
        *self >= Self::ZERO && *self <= Self::MAX_UNIT
    }

    /// Format with exactly two decimals (e.g., `"25.50"`).
    ///
    /// Midpoints round away from zero.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit.
    pub fn times(self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        Decimal::from_str(trimmed)
            .map(Self)
            .map_err(|_| PriceError::Invalid(trimmed.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_two_decimals() {
        assert_eq!(Price::from_str("25.5").unwrap().display(), "25.50");
        assert_eq!(Price::from_str("10").unwrap().display(), "10.00");
        assert_eq!(Price::ZERO.display(), "0.00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Price::from_str("1.005").unwrap().display(), "1.01");
        assert_eq!(Price::from_str("1.004").unwrap().display(), "1.00");
    }

    #[test]
    fn test_times_and_add() {
        let total = Price::from_str("10")
            .unwrap()
            .times(2)
            .unwrap()
            .checked_add(Price::from_str("5.5").unwrap().times(1).unwrap())
            .unwrap();
        assert_eq!(total.display(), "25.50");
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        let max = Price::from_str("79228162514264337593543950335").unwrap();
        assert_eq!(max.times(2), Err(PriceError::Overflow));
        assert_eq!(max.checked_add(max), Err(PriceError::Overflow));
        assert_eq!(max.times(1), Ok(max));
    }

    #[test]
    fn test_unit_price_range() {
        assert!(Price::ZERO.is_valid_unit());
        assert!(Price::from_str("1000000").unwrap().is_valid_unit());
        assert!(!Price::from_str("1000000.01").unwrap().is_valid_unit());
        assert!(!Price::from_str("-1").unwrap().is_valid_unit());
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let from_number: Price = serde_json::from_str("5.5").unwrap();
        let from_string: Price = serde_json::from_str("\"5.50\"").unwrap();
        let from_int: Price = serde_json::from_str("12").unwrap();
        assert_eq!(from_number.display(), "5.50");
        assert_eq!(from_string.display(), "5.50");
        assert_eq!(from_int.display(), "12.00");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Price::from_str("  "), Err(PriceError::Empty));
        assert!(matches!(Price::from_str("abc"), Err(PriceError::Invalid(_))));
    }
}
