use serde::{Deserialize, Serialize};

/// The closed set of currencies a wallet can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    /// All supported currencies, in display order.
    pub const ALL: [Currency; 4] = [Currency::Inr, Currency::Usd, Currency::Eur, Currency::Gbp];

    /// The pivot currency all exchange rates are expressed against.
    pub const PIVOT: Currency = Currency::Inr;

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INR" => Some(Currency::Inr),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }

    /// Position of this currency in [`Currency::ALL`].
    pub(crate) fn index(&self) -> usize {
        match self {
            Currency::Inr => 0,
            Currency::Usd => 1,
            Currency::Eur => 2,
            Currency::Gbp => 3,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_roundtrip() {
        for currency in Currency::ALL {
            let parsed = Currency::from_str(currency.as_str()).unwrap();
            assert_eq!(currency, parsed);
        }
    }

    #[test]
    fn test_currency_parse_is_case_insensitive() {
        assert_eq!(Currency::from_str("usd"), Some(Currency::Usd));
        assert_eq!(Currency::from_str(" Gbp "), Some(Currency::Gbp));
        assert_eq!(Currency::from_str("JPY"), None);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, currency) in Currency::ALL.iter().enumerate() {
            assert_eq!(currency.index(), i);
        }
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&Currency::Eur).unwrap();
        assert_eq!(json, "\"EUR\"");
    }
}
