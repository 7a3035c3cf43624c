//! Money conversions between major and minor currency units.
//!
//! Prices are stored and displayed in major units (dollars) as
//! `rust_decimal::Decimal`. The payment gateway speaks minor units (cents),
//! so the conversion must be exact: no float arithmetic anywhere, and
//! sub-cent values round half-up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur converting money values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount is too large to express in minor units.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// Convert a major-unit amount (e.g., 19.99) to minor units (1999).
///
/// Rounds half-up on the computed cents value, so 0.005 becomes 1 cent.
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative amounts and
/// [`MoneyError::OutOfRange`] if the cents value does not fit in `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }

    let cents = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    cents.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Convert a minor-unit amount (e.g., 1999) back to major units (19.99).
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// ISO 4217 currency codes accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Uppercase ISO code (e.g., "USD").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// Lowercase code as the gateway API expects (e.g., "usd").
    #[must_use]
    pub const fn gateway_code(&self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_conversion() {
        // 19.99 * 3 = 59.97 -> 5997 cents, no float drift
        let unit = Decimal::new(1999, 2);
        let total = unit * Decimal::from(3);
        assert_eq!(to_minor_units(total).unwrap(), 5997);
    }

    #[test]
    fn test_whole_dollars() {
        assert_eq!(to_minor_units(Decimal::from(25)).unwrap(), 2500);
    }

    #[test]
    fn test_rounds_half_up() {
        // 0.005 dollars = 0.5 cents -> rounds up to 1
        assert_eq!(to_minor_units(Decimal::new(5, 3)).unwrap(), 1);
        // 0.004 dollars = 0.4 cents -> rounds down to 0
        assert_eq!(to_minor_units(Decimal::new(4, 3)).unwrap(), 0);
        // 12.345 -> 1235 cents
        assert_eq!(to_minor_units(Decimal::new(12345, 3)).unwrap(), 1235);
    }

    #[test]
    fn test_zero() {
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            to_minor_units(Decimal::new(-1, 2)),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(from_minor_units(5997), Decimal::new(5997, 2));
        assert_eq!(from_minor_units(100), Decimal::from(1));
        assert_eq!(from_minor_units(0), Decimal::ZERO);
    }

    #[test]
    fn test_roundtrip_no_drift_across_many_pairs() {
        // Pseudo-random price/quantity pairs; conversion must be exact for
        // every two-decimal price.
        let mut seed: u64 = 0x00c0_ffee;
        for _ in 0..1_000 {
            // xorshift64
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            let cents = i64::try_from(seed % 100_000).unwrap(); // up to $999.99
            let quantity = i64::try_from(seed % 9 + 1).unwrap();

            let unit = from_minor_units(cents);
            let total = unit * Decimal::from(quantity);
            assert_eq!(to_minor_units(total).unwrap(), cents * quantity);
        }
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::USD.code(), "USD");
        assert_eq!(CurrencyCode::USD.gateway_code(), "usd");
        assert_eq!(CurrencyCode::default(), CurrencyCode::USD);
    }
}
