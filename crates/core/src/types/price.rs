//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12,2)` and displayed in whole currency
//! units with space-grouped thousands (`12 500 ₸`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a number.
    #[error("price must be a number, got '{0}'")]
    Invalid(String),
    /// The number is negative.
    #[error("price cannot be negative")]
    Negative,
    /// The number does not fit the storage column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Upper bound (exclusive).
        max: Decimal,
    },
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (tenge, not tiyn).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default currency.
    #[must_use]
    pub const fn from_amount(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::KZT)
    }

    /// A zero price in the default currency.
    #[must_use]
    pub const fn zero() -> Self {
        Self::from_amount(Decimal::ZERO)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Largest amount accepted by the `NUMERIC(12,2)` columns (exclusive).
    #[must_use]
    pub fn max_amount() -> Decimal {
        Decimal::new(10_000_000_000, 0)
    }

    /// Parse a price typed by a user.
    ///
    /// Spaces are treated as thousands separators, a comma as the decimal
    /// separator, and a trailing currency symbol is ignored. The result is
    /// rounded to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, negative, or
    /// too large to store.
    pub fn parse_input(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input
            .trim()
            .trim_end_matches(CurrencyCode::KZT.symbol())
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        if cleaned.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(&cleaned)
            .map_err(|_| PriceError::Invalid(input.trim().to_owned()))?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let amount = amount.round_dp(2);
        let max = Self::max_amount();
        if amount >= max {
            return Err(PriceError::TooLarge { max });
        }

        Ok(Self::from_amount(amount))
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.amount.round();
        let digits = whole.abs().to_string();
        let digits = digits.split('.').next().unwrap_or("0");
        let sign = if whole.is_sign_negative() && !whole.is_zero() {
            "-"
        } else {
            ""
        };
        write!(
            f,
            "{sign}{} {}",
            group_thousands(digits),
            self.currency_code.symbol()
        )
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, price| {
            Self::new(acc.amount + price.amount, price.currency_code)
        })
    }
}

/// Insert a space between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KZT,
    RUB,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Symbol printed after the amount.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::KZT => "₸",
            Self::RUB => "₽",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KZT => "KZT",
            Self::RUB => "RUB",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_amount(dec("12500")).to_string(), "12 500 ₸");
        assert_eq!(Price::from_amount(dec("8000.00")).to_string(), "8 000 ₸");
        assert_eq!(Price::from_amount(dec("999")).to_string(), "999 ₸");
        assert_eq!(
            Price::from_amount(dec("1234567")).to_string(),
            "1 234 567 ₸"
        );
        assert_eq!(Price::zero().to_string(), "0 ₸");
    }

    #[test]
    fn test_display_rounds_to_whole_units() {
        assert_eq!(Price::from_amount(dec("1499.60")).to_string(), "1 500 ₸");
        assert_eq!(Price::from_amount(dec("2.5")).to_string(), "2 ₸");
    }

    #[test]
    fn test_parse_input_accepts_spaces_and_comma() {
        assert_eq!(Price::parse_input("12 500").unwrap().amount, dec("12500"));
        assert_eq!(Price::parse_input("99,90").unwrap().amount, dec("99.90"));
        assert_eq!(Price::parse_input(" 5000 ₸ ").unwrap().amount, dec("5000"));
        assert_eq!(Price::parse_input("0").unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_parse_input_rounds_to_cents() {
        assert_eq!(Price::parse_input("10.456").unwrap().amount, dec("10.46"));
    }

    #[test]
    fn test_parse_input_rejects_bad_values() {
        assert_eq!(Price::parse_input("   "), Err(PriceError::Empty));
        assert!(matches!(
            Price::parse_input("cheap"),
            Err(PriceError::Invalid(_))
        ));
        assert_eq!(Price::parse_input("-5"), Err(PriceError::Negative));
        assert!(matches!(
            Price::parse_input("10000000000"),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(matches!(
            Price::parse_input("9999999999.999"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_sum() {
        let total: Price = [dec("100"), dec("250.50"), dec("49.50")]
            .into_iter()
            .map(Price::from_amount)
            .sum();
        assert_eq!(total.amount, dec("400.00"));
    }
}
