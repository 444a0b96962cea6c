use super::{Amount, Currency};

/// Fixed exchange rates: the value of one unit of the pivot currency (INR)
/// expressed in each currency. The pivot's own rate is exactly 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRateTable {
    rates: [f64; 4],
}

/// The rate table the wallet ships with.
pub const FIXED_RATES: ExchangeRateTable = ExchangeRateTable {
    // INR, USD, EUR, GBP
    rates: [1.0, 0.012, 0.011, 0.009],
};

impl ExchangeRateTable {
    pub fn fixed() -> Self {
        FIXED_RATES
    }

    /// Value of one pivot unit in `currency`.
    pub fn rate_of(&self, currency: Currency) -> f64 {
        self.rates[currency.index()]
    }

    /// Units of `to` received for one unit of `from`.
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        self.rate_of(to) / self.rate_of(from)
    }

    /// Convert through the pivot currency: `amount / rate[from] * rate[to]`.
    /// The result is not rounded.
    pub fn convert(&self, amount: Amount, from: Currency, to: Currency) -> Amount {
        let pivot_amount = amount / self.rate_of(from);
        pivot_amount * self.rate_of(to)
    }
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self::fixed()
    }
}

/// Convert using the fixed rate table.
pub fn convert(amount: Amount, from: Currency, to: Currency) -> Amount {
    FIXED_RATES.convert(amount, from, to)
}
