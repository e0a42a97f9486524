use crate::error::MarketError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A monetary value in the marketplace currency.
///
/// Wraps `rust_decimal::Decimal` so that amounts, discounts and commissions
/// are never computed with floating point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Builds an amount that must be strictly positive (prices, fixed discounts).
    pub fn positive(amount: Decimal) -> Result<Self, MarketError> {
        if amount > Decimal::ZERO {
            Ok(Self(amount))
        } else {
            Err(MarketError::Validation(format!(
                "Amount must be positive, got {}",
                amount
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: Decimal) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

/// A commission rate expressed as a fraction of the order value (`0.10` = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Result<Self, MarketError> {
        if value >= Decimal::ZERO && value <= Decimal::ONE {
            Ok(Self(value))
        } else {
            Err(MarketError::Validation(format!(
                "Commission rate must be between 0 and 1, got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Commission owed on `amount` at this rate.
    pub fn apply(&self, amount: Money) -> Money {
        amount * self.0
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = MarketError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(10.0));
        let b = Money::new(dec!(2.5));
        assert_eq!(a + b, Money::new(dec!(12.5)));
        assert_eq!(a - b, Money::new(dec!(7.5)));
        assert_eq!(a.min(b), b);
        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total, Money::new(dec!(15.0)));
    }

    #[test]
    fn test_money_positive_validation() {
        assert!(Money::positive(dec!(0.01)).is_ok());
        assert!(matches!(
            Money::positive(dec!(0)),
            Err(MarketError::Validation(_))
        ));
        assert!(matches!(
            Money::positive(dec!(-3)),
            Err(MarketError::Validation(_))
        ));
    }

    #[test]
    fn test_rate_bounds() {
        assert!(Rate::new(dec!(0)).is_ok());
        assert!(Rate::new(dec!(1)).is_ok());
        assert!(Rate::new(dec!(1.01)).is_err());
        assert!(Rate::new(dec!(-0.1)).is_err());
    }

    #[test]
    fn test_rate_apply_is_exact() {
        let rate = Rate::new(dec!(0.15)).unwrap();
        assert_eq!(rate.apply(Money::new(dec!(100))), Money::new(dec!(15)));
        assert_eq!(rate.apply(Money::new(dec!(150))), Money::new(dec!(22.5)));
    }

    #[test]
    fn test_rate_deserialization_rejects_out_of_range() {
        let ok: Rate = serde_json::from_str("\"0.2\"").unwrap();
        assert_eq!(ok.value(), dec!(0.2));
        assert!(serde_json::from_str::<Rate>("\"2\"").is_err());
    }
}
