//! Monetary amounts using decimal arithmetic.

use core::fmt;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
    EUR,
    BRL,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ARS | Self::USD => "$",
            Self::EUR => "€",
            Self::BRL => "R$",
        }
    }
}

/// An amount of money in a single currency.
///
/// Amounts are serialized as strings (`"1234.50"`) to preserve precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the currency's standard unit (pesos, not cents).
    pub amount: Decimal,
    /// Currency code; the backend omits it for the store currency.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self::new(self.amount * Decimal::from(rhs), self.currency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        let price = Money::new(Decimal::new(123_450, 2), CurrencyCode::ARS);
        assert_eq!(price.to_string(), "$1234.50");
        let price = Money::new(Decimal::from(10), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "€10.00");
    }

    #[test]
    fn test_arithmetic() {
        let unit = Money::new(Decimal::new(250, 2), CurrencyCode::ARS);
        let total = unit * 3 + Money::zero(CurrencyCode::ARS);
        assert_eq!(total.amount, Decimal::new(750, 2));
    }

    #[test]
    fn test_deserialize_without_currency() {
        let money: Money = serde_json::from_str(r#"{"amount":"99.90"}"#).unwrap();
        assert_eq!(money.currency, CurrencyCode::ARS);
        assert_eq!(money.amount, Decimal::new(9990, 2));
    }
}
