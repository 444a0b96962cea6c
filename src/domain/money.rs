use std::fmt;

use super::Currency;

/// Money is represented as a plain `f64` in the unit of its currency.
/// Balances keep full precision; rounding happens only for display.
pub type Amount = f64;

/// Check that an amount can be used in a ledger operation:
/// it must be finite and strictly positive.
pub fn validate_amount(amount: Amount) -> Result<(), InvalidAmount> {
    if !amount.is_finite() {
        return Err(InvalidAmount::NotFinite);
    }
    if amount <= 0.0 {
        return Err(InvalidAmount::NotPositive);
    }
    Ok(())
}

/// Round to two decimal places, halves away from zero.
pub fn round_display(amount: Amount) -> Amount {
    (amount * 100.0).round() / 100.0
}

/// Format an amount with its currency symbol and exactly two decimals.
/// Example: (1234.5, INR) -> "₹1234.50", (1.2, USD) -> "$1.20"
///
/// Display only: never feed the result back into a balance.
pub fn format_amount(amount: Amount, currency: Currency) -> String {
    format!("{}{:.2}", currency.symbol(), round_display(amount))
}

/// Parse a user-entered decimal string into an amount.
/// Example: "50.00" -> 50.0, "12.5" -> 12.5, ".5" -> 0.5
///
/// Only syntax is checked here; use [`validate_amount`] for sign.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }

    // Reject things f64::from_str accepts but a money field should not
    let digits = input.trim_start_matches('-');
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(ParseAmountError::InvalidFormat);
    }

    let value: Amount = input
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat)?;
    if !value.is_finite() {
        return Err(ParseAmountError::InvalidFormat);
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAmount {
    NotFinite,
    NotPositive,
    /// The resulting balance would not be a finite number
    Overflow,
}

impl fmt::Display for InvalidAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidAmount::NotFinite => write!(f, "amount must be a finite number"),
            InvalidAmount::NotPositive => write!(f, "amount must be greater than 0"),
            InvalidAmount::Overflow => write!(f, "resulting balance is out of range"),
        }
    }
}

impl std::error::Error for InvalidAmount {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(1000.0).is_ok());
        assert_eq!(validate_amount(0.0), Err(InvalidAmount::NotPositive));
        assert_eq!(validate_amount(-5.0), Err(InvalidAmount::NotPositive));
        assert_eq!(validate_amount(f64::NAN), Err(InvalidAmount::NotFinite));
        assert_eq!(
            validate_amount(f64::INFINITY),
            Err(InvalidAmount::NotFinite)
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1000.0, Currency::Inr), "₹1000.00");
        assert_eq!(format_amount(1.2, Currency::Usd), "$1.20");
        assert_eq!(format_amount(0.0, Currency::Eur), "€0.00");
        assert_eq!(format_amount(12.346, Currency::Gbp), "£12.35");
        assert_eq!(format_amount(0.125, Currency::Usd), "$0.13");
    }

    #[test]
    fn test_round_display() {
        assert_eq!(round_display(1.005_000_1), 1.01);
        assert_eq!(round_display(2.5), 2.5);
        assert_eq!(round_display(0.994), 0.99);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(50.0));
        assert_eq!(parse_amount("50"), Ok(50.0));
        assert_eq!(parse_amount("12.5"), Ok(12.5));
        assert_eq!(parse_amount(".5"), Ok(0.5));
        assert_eq!(parse_amount(" 0.01 "), Ok(0.01));
        assert_eq!(parse_amount("-5"), Ok(-5.0));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.34.56").is_err());
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("1e3").is_err());
    }
}
