use serde::{Deserialize, Serialize};

use super::{Amount, Currency};

/// Funds held per currency. Every currency always has an entry.
///
/// Stored as a JSON object keyed by currency code, e.g.
/// `{"INR":1000.0,"USD":0.0,"EUR":0.0,"GBP":0.0}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "INR")]
    inr: Amount,
    #[serde(rename = "USD")]
    usd: Amount,
    #[serde(rename = "EUR")]
    eur: Amount,
    #[serde(rename = "GBP")]
    gbp: Amount,
}

/// Seed amount of the pivot currency a new wallet starts with.
pub const SEED_INR: Amount = 1000.0;

impl Balance {
    /// A balance with every currency at zero.
    pub fn zero() -> Self {
        Self {
            inr: 0.0,
            usd: 0.0,
            eur: 0.0,
            gbp: 0.0,
        }
    }

    /// The balance a fresh wallet starts with: INR=1000, others 0.
    pub fn seed() -> Self {
        Self::zero().with(Currency::Inr, SEED_INR)
    }

    pub fn with(mut self, currency: Currency, amount: Amount) -> Self {
        *self.slot(currency) = amount;
        self
    }

    pub fn get(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Inr => self.inr,
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
            Currency::Gbp => self.gbp,
        }
    }

    /// Iterate `(currency, amount)` pairs in [`Currency::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Amount)> + '_ {
        Currency::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn covers(&self, currency: Currency, amount: Amount) -> bool {
        self.get(currency) >= amount
    }

    // Mutation is crate-private: only the ledger moves money.
    pub(crate) fn credit(&mut self, currency: Currency, amount: Amount) {
        *self.slot(currency) += amount;
    }

    pub(crate) fn debit(&mut self, currency: Currency, amount: Amount) {
        *self.slot(currency) -= amount;
    }

    fn slot(&mut self, currency: Currency) -> &mut Amount {
        match currency {
            Currency::Inr => &mut self.inr,
            Currency::Usd => &mut self.usd,
            Currency::Eur => &mut self.eur,
            Currency::Gbp => &mut self.gbp,
        }
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::seed()
    }
}
