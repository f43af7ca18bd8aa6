//! Type-safe price representation using decimal arithmetic.
//!
//! The content store keeps prices as JSON numbers in US dollars, so `Price`
//! round-trips through a float on the wire while arithmetic stays decimal.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A USD amount in dollars (not cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal dollar amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The dollar amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Apply a percentage discount, clamped to 0-100 and rounded to cents.
    #[must_use]
    pub fn discounted(&self, percent: Decimal) -> Self {
        let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let factor = (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
        Self((self.0 * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Amount in cents, rounded half away from zero.
    ///
    /// This is the `unit_amount` the payment gateway expects.
    #[must_use]
    pub fn to_minor_units(&self) -> i64 {
        let cents = (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        i64::try_from(cents).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(Price::from_cents(1999).to_minor_units(), 1999);
        assert_eq!(Price::new(Decimal::new(10_005, 3)).to_minor_units(), 1001);
        assert_eq!(Price::new(Decimal::new(10_004, 3)).to_minor_units(), 1000);
    }

    #[test]
    fn test_discounted() {
        let price = Price::from_cents(20_000);
        assert_eq!(price.discounted(Decimal::from(25)), Price::from_cents(15_000));
        assert_eq!(price.discounted(Decimal::from(150)), Price::ZERO);
        assert_eq!(price.discounted(Decimal::from(-5)), price);
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::from_cents(4550);
        assert_eq!(serde_json::to_string(&price).unwrap(), "45.5");

        let parsed: Price = serde_json::from_str("199.99").unwrap();
        assert_eq!(parsed, Price::from_cents(19_999));
    }

    #[test]
    fn test_sum_and_mul() {
        let total: Price = [Price::from_cents(100) * 3, Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(550));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1050).to_string(), "$10.50");
    }
}
