//! Type-safe money representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
///
/// Wraps [`Decimal`] so that prices and totals never go through floating
/// point. The store trades in a single currency ([`CurrencyCode::SDG`] by
/// default), carried in the settings document rather than on every amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// True for amounts strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Money {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes the store can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Sudanese pound.
    #[default]
    SDG,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for receipts and totals.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::SDG => "SDG",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_exact() {
        let unit = Money::from(100_u32);
        let line = unit * 2;
        assert_eq!(line, Money::from(200_u32));
        assert_eq!(line + Money::from(15_u32), Money::from(215_u32));
    }

    #[test]
    fn sum_over_lines() {
        let total: Money = [Money::from(10_u32), Money::from(5_u32)].into_iter().sum();
        assert_eq!(total, Money::from(15_u32));
    }

    #[test]
    fn negative_detection() {
        assert!(Money::new(Decimal::from(-1)).is_negative());
        assert!(!Money::ZERO.is_negative());
    }
}
