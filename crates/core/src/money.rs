//! Currency-safe monetary value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// ISO-4217-style currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency code must be three uppercase ASCII letters, got '{code}'"
            )));
        }
        Ok(Self(code))
    }

    /// US dollars.
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Euros.
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable monetary amount in a single currency.
///
/// All arithmetic returns a **new** instance; operations between different
/// currencies are illegal and fail with a validation error. Amounts use exact
/// decimal arithmetic (no binary floating point).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::validation(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::validation("monetary amount overflow"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    pub fn subtract(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| DomainError::validation("monetary amount overflow"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    pub fn multiply(&self, factor: Decimal) -> DomainResult<Money> {
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| DomainError::validation("monetary amount overflow"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Round to `dp` decimal places (banker's rounding).
    pub fn round_dp(&self, dp: u32) -> Money {
        Money::new(self.amount.round_dp(dp), self.currency.clone())
    }

    /// Compare amounts; fails across currencies.
    pub fn lt(&self, other: &Money) -> DomainResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    /// Compare amounts; fails across currencies.
    pub fn gt(&self, other: &Money) -> DomainResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    #[test]
    fn add_then_subtract_round_trips() {
        let a = usd(dec!(1234.56));
        let b = usd(dec!(789.01));
        let round_trip = a.add(&b).unwrap().subtract(&b).unwrap();
        assert_eq!(round_trip, a);
    }

    #[test]
    fn cross_currency_arithmetic_always_fails() {
        let a = usd(dec!(100));
        let b = Money::new(dec!(100), Currency::eur());
        assert!(a.add(&b).is_err());
        assert!(a.subtract(&b).is_err());
        assert!(a.lt(&b).is_err());
    }

    #[test]
    fn multiply_scales_amount() {
        let price = usd(dec!(20000));
        assert_eq!(price.multiply(dec!(3)).unwrap(), usd(dec!(60000)));
    }

    #[test]
    fn zero_is_zero() {
        assert!(Money::zero(Currency::usd()).is_zero());
        assert!(!usd(dec!(0.01)).is_zero());
    }

    #[test]
    fn negative_detection() {
        assert!(usd(dec!(-1)).is_negative());
        assert!(!usd(dec!(0)).is_negative());
        assert!(!usd(dec!(1)).is_negative());
    }

    #[test]
    fn currency_codes_are_validated() {
        assert!(Currency::new("USD").is_ok());
        assert!(Currency::new("usd").is_err());
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDX").is_err());
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(usd(dec!(100)), usd(dec!(100)));
        assert_ne!(usd(dec!(100)), usd(dec!(100.01)));
        assert_ne!(usd(dec!(100)), Money::new(dec!(100), Currency::eur()));
    }
}
