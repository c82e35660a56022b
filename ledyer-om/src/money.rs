//! Minor-unit conversion with round-half-up semantics.
//!
//! Order stores report amounts in major units (`12.50`), Ledyer expects integer
//! minor units (`1250`). Every conversion and division here rounds exact halves away
//! from zero at the currency's ISO 4217 scale.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::error::{LedyerError, Result};

/// Currencies without a minor unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

/// Currencies with three decimal places.
const THREE_DECIMAL_CURRENCIES: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// An ISO 4217 currency together with its minor-unit scale.
///
/// # Examples
///
/// ```
/// use ledyer_om::money::Currency;
/// use rust_decimal::Decimal;
///
/// let sek = Currency::new("SEK")?;
/// assert_eq!(sek.scale(), 2);
/// assert_eq!(sek.to_minor(Decimal::new(1005, 3))?, 101); // 1.005 -> 1.01
///
/// let jpy = Currency::new("jpy")?;
/// assert_eq!(jpy.to_minor(Decimal::new(1235, 1))?, 124); // 123.5 -> 124
/// # Ok::<(), ledyer_om::LedyerError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    code: String,
    scale: u32,
}

impl Currency {
    /// Resolves a currency code.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`] unless `code` is three ASCII letters.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LedyerError::DataError(format!("invalid currency code: '{code}'")));
        }

        let scale = if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
            0
        } else if THREE_DECIMAL_CURRENCIES.contains(&code.as_str()) {
            3
        } else {
            2
        };

        Ok(Self { code, scale })
    }

    /// Returns the upper-case currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the number of minor-unit digits.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Converts a major-unit amount to integer minor units, rounding half-up.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`] if the result does not fit in `i64`.
    pub fn to_minor(&self, amount: Decimal) -> Result<i64> {
        let factor = Decimal::from(10_i64.pow(self.scale));
        let minor = amount
            .checked_mul(factor)
            .ok_or_else(|| overflow(amount, &self.code))?
            .round_dp_with_strategy(0, ROUNDING);
        minor.to_i64().ok_or_else(|| overflow(amount, &self.code))
    }

    /// Converts `amount` to minor units and divides it by `divisor`, rounding half-up.
    ///
    /// # Errors
    ///
    /// Returns [`LedyerError::DataError`] if `divisor` is zero or the amount overflows.
    pub fn divide_to_minor(&self, amount: Decimal, divisor: u32) -> Result<i64> {
        divide_minor(self.to_minor(amount)?, divisor)
    }
}

/// Divides a minor-unit amount, rounding half-up.
///
/// # Errors
///
/// Returns [`LedyerError::DataError`] if `divisor` is zero.
///
/// # Examples
///
/// ```
/// use ledyer_om::money::divide_minor;
///
/// assert_eq!(divide_minor(1060, 2)?, 530);
/// assert_eq!(divide_minor(1001, 2)?, 501);
/// assert_eq!(divide_minor(-1001, 2)?, -501);
/// # Ok::<(), ledyer_om::LedyerError>(())
/// ```
pub fn divide_minor(minor: i64, divisor: u32) -> Result<i64> {
    if divisor == 0 {
        return Err(LedyerError::DataError("division by zero quantity".to_owned()));
    }
    let quotient =
        (Decimal::from(minor) / Decimal::from(divisor)).round_dp_with_strategy(0, ROUNDING);
    quotient
        .to_i64()
        .ok_or_else(|| LedyerError::DataError(format!("{minor} / {divisor} overflows")))
}

/// Rounds a percentage to the nearest integer, halves away from zero.
#[must_use]
pub fn round_percent(rate: Decimal) -> u8 {
    rate.round_dp_with_strategy(0, ROUNDING)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .to_u8()
        .unwrap_or(0)
}

fn overflow(amount: Decimal, code: &str) -> LedyerError {
    LedyerError::DataError(format!("amount {amount} {code} does not fit in minor units"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_scales() {
        assert_eq!(Currency::new("SEK").unwrap().scale(), 2);
        assert_eq!(Currency::new("EUR").unwrap().scale(), 2);
        assert_eq!(Currency::new("JPY").unwrap().scale(), 0);
        assert_eq!(Currency::new("ISK").unwrap().scale(), 0);
        assert_eq!(Currency::new("KWD").unwrap().scale(), 3);
    }

    #[test]
    fn test_currency_code_normalized() {
        let currency = Currency::new(" nok ").unwrap();
        assert_eq!(currency.code(), "NOK");
    }

    #[test]
    fn test_invalid_currency_code() {
        assert!(matches!(Currency::new(""), Err(LedyerError::DataError(_))));
        assert!(matches!(Currency::new("SEKK"), Err(LedyerError::DataError(_))));
        assert!(matches!(Currency::new("S3K"), Err(LedyerError::DataError(_))));
    }

    #[test]
    fn test_to_minor_rounds_half_up() {
        let sek = Currency::new("SEK").unwrap();
        assert_eq!(sek.to_minor(Decimal::new(1060, 2)).unwrap(), 1060);
        assert_eq!(sek.to_minor(Decimal::new(12345, 3)).unwrap(), 1235);
        assert_eq!(sek.to_minor(Decimal::new(12344, 3)).unwrap(), 1234);
        assert_eq!(sek.to_minor(Decimal::new(-12345, 3)).unwrap(), -1235);
    }

    #[test]
    fn test_to_minor_three_decimals() {
        let kwd = Currency::new("KWD").unwrap();
        assert_eq!(kwd.to_minor(Decimal::new(12345, 4)).unwrap(), 1235);
    }

    #[test]
    fn test_to_minor_overflow() {
        let sek = Currency::new("SEK").unwrap();
        assert!(matches!(sek.to_minor(Decimal::MAX), Err(LedyerError::DataError(_))));
    }

    #[test]
    fn test_divide_minor() {
        assert_eq!(divide_minor(1060, 2).unwrap(), 530);
        assert_eq!(divide_minor(1000, 3).unwrap(), 333);
        assert_eq!(divide_minor(1001, 2).unwrap(), 501);
        assert_eq!(divide_minor(5, 1).unwrap(), 5);
        assert!(divide_minor(5, 0).is_err());
    }

    #[test]
    fn test_divide_to_minor() {
        let sek = Currency::new("SEK").unwrap();
        assert_eq!(sek.divide_to_minor(Decimal::new(1060, 2), 2).unwrap(), 530);
        assert_eq!(sek.divide_to_minor(Decimal::new(1000, 2), 3).unwrap(), 333);
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(Decimal::new(25, 0)), 25);
        assert_eq!(round_percent(Decimal::new(125, 1)), 13);
        assert_eq!(round_percent(Decimal::new(124, 1)), 12);
        assert_eq!(round_percent(Decimal::new(150, 0)), 100);
        assert_eq!(round_percent(Decimal::new(-5, 0)), 0);
    }
}
