//! Monetary amounts using decimal arithmetic.
//!
//! The store sells in a single currency, so a price is just a non-negative
//! decimal with at most two fractional digits. Conversions to minor units
//! (cents) exist for the payment gateway.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors produced when validating a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has sub-cent precision.
    #[error("price can have at most two decimal places")]
    TooPrecise,
}

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] for negative amounts or more than two decimals.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Build a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for negative input.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount in minor units (cents), as the payment gateway expects.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_cents(&self) -> Option<i64> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|d| d.round_dp(0))
            .and_then(|d| d.to_i64())
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display, e.g. `$59.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative_and_sub_cent() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert_eq!(Price::new(Decimal::new(1999, 3)), Err(PriceError::TooPrecise));
        // Trailing zeros are fine
        assert!(Price::new(Decimal::new(59_990, 3)).is_ok());
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_cents_conversion() {
        let price = Price::from_cents(5999).unwrap();
        assert_eq!(price.to_cents(), Some(5999));
        assert_eq!(price.display(), "$59.99");
    }

    #[test]
    fn test_times_and_sum() {
        let a = Price::from_cents(1000).unwrap().times(3);
        let b = Price::from_cents(250).unwrap();
        let total: Price = [a, b].iter().sum();
        assert_eq!(total.to_cents(), Some(3250));
        assert_eq!(total.to_string(), "$32.50");
    }
}
