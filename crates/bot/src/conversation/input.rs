//! Validation of typed answers to wizard prompts.

use thiserror::Error;
use url::Url;

use studybot_core::{EmailError, PhoneError, Price, PriceError};

/// Answer that means "leave this empty" in optional text steps.
pub const SKIP_MARKER: &str = "-";

/// Why an answer was not accepted. The message is shown to the user, who is
/// then asked the same question again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("{field} is too short: at least {min} characters, please.")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} is too long: at most {max} characters, please.")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid price: {0}. Send a number, e.g. 15000.")]
    Price(#[from] PriceError),

    #[error("The price must be greater than zero.")]
    ZeroPrice,

    #[error("The discount must be lower than the price ({price}).")]
    DiscountNotLower { price: Price },

    #[error("Invalid email: {0}.")]
    Email(#[from] EmailError),

    #[error("Invalid phone number: {0}.")]
    Phone(#[from] PhoneError),

    #[error("Send a full link starting with http:// or https://.")]
    Url,

    #[error("Please choose one of the buttons.")]
    ExpectedButton,

    #[error("Please send the file as a document.")]
    ExpectedDocument,

    #[error("This step cannot be skipped.")]
    NotSkippable,
}

/// A required text answer, trimmed, between `min` and `max` characters.
///
/// # Errors
///
/// Returns `StepError::TooShort` or `StepError::TooLong`.
pub fn required_text(
    input: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, StepError> {
    let text = input.trim();
    let len = text.chars().count();
    if len < min.max(1) {
        return Err(StepError::TooShort {
            field,
            min: min.max(1),
        });
    }
    if len > max {
        return Err(StepError::TooLong { field, max });
    }
    Ok(text.to_string())
}

/// An optional text answer where [`SKIP_MARKER`] or blank means none.
///
/// # Errors
///
/// Returns `StepError::TooLong` if the answer exceeds `max` characters.
pub fn optional_text(
    input: &str,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, StepError> {
    let text = input.trim();
    if text.is_empty() || text == SKIP_MARKER {
        return Ok(None);
    }
    required_text(text, field, 1, max).map(Some)
}

/// A strictly positive price.
///
/// # Errors
///
/// Returns `StepError::Price` for malformed input and `StepError::ZeroPrice`
/// for zero.
pub fn positive_price(input: &str) -> Result<Price, StepError> {
    let price = Price::parse_input(input)?;
    if price.is_zero() {
        return Err(StepError::ZeroPrice);
    }
    Ok(price)
}

/// An optional http(s) link.
///
/// # Errors
///
/// Returns `StepError::Url` if the answer is not an http(s) URL.
pub fn optional_url(input: &str) -> Result<Option<String>, StepError> {
    let Some(text) = optional_text(input, "Link", 500)? else {
        return Ok(None);
    };
    match Url::parse(&text) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Ok(Some(url.to_string()))
        }
        _ => Err(StepError::Url),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_required_text_bounds() {
        assert_eq!(
            required_text("  Hotel booking  ", "Title", 3, 255).unwrap(),
            "Hotel booking"
        );
        assert_eq!(
            required_text("ab", "Title", 3, 255),
            Err(StepError::TooShort {
                field: "Title",
                min: 3
            })
        );
        assert_eq!(
            required_text("абвгд", "Icon", 1, 4),
            Err(StepError::TooLong {
                field: "Icon",
                max: 4
            })
        );
    }

    #[test]
    fn test_optional_text_skip_marker() {
        assert_eq!(optional_text("-", "Budget", 255).unwrap(), None);
        assert_eq!(optional_text("   ", "Budget", 255).unwrap(), None);
        assert_eq!(
            optional_text("up to 20 000", "Budget", 255).unwrap().as_deref(),
            Some("up to 20 000")
        );
    }

    #[test]
    fn test_positive_price() {
        assert_eq!(
            positive_price("12 500").unwrap(),
            Price::from_amount(Decimal::from(12_500))
        );
        assert_eq!(positive_price("0"), Err(StepError::ZeroPrice));
        assert!(matches!(positive_price("cheap"), Err(StepError::Price(_))));
    }

    #[test]
    fn test_optional_url() {
        assert_eq!(
            optional_url("https://demo.example.kz/shop").unwrap().as_deref(),
            Some("https://demo.example.kz/shop")
        );
        assert_eq!(optional_url("-").unwrap(), None);
        assert_eq!(optional_url("ftp://files.example.kz"), Err(StepError::Url));
        assert_eq!(optional_url("not a link"), Err(StepError::Url));
    }
}
