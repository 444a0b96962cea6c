use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::{
    validate_amount, Amount, Balance, BankDetails, Currency, ExchangeRateTable, InvalidAmount,
    Transaction, TransactionLog, TransactionRecord,
};

/// Why a ledger operation was refused. The balance is untouched in every case.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Amount, reason: InvalidAmount },

    #[error("Insufficient {currency} balance: available {available}, required {required}")]
    InsufficientFunds {
        currency: Currency,
        available: Amount,
        required: Amount,
    },

    #[error("Cannot exchange {0} to itself, select a different currency")]
    SameCurrency(Currency),

    #[error("Invalid bank details: {0} is required")]
    InvalidBankDetails(&'static str),
}

impl LedgerError {
    /// Stable machine-readable kind, for callers that branch on the failure.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "invalid_amount",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::SameCurrency(_) => "same_currency",
            LedgerError::InvalidBankDetails(_) => "invalid_bank_details",
        }
    }
}

/// Outcome of a committed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    /// Balance right after the operation
    pub balance: Balance,
    /// The transaction that was appended to the log
    pub transaction: Transaction,
}

/// Preview of an exchange, computed without committing anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeQuote {
    pub amount: Amount,
    pub from: Currency,
    pub to: Currency,
    pub converted_amount: Amount,
    /// Units of `to` per unit of `from`
    pub rate: f64,
    /// Whether the current balance covers `amount`
    pub sufficient_funds: bool,
}

/// Preview of a withdrawal against the current balance.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalPreview {
    pub amount: Amount,
    pub currency: Currency,
    pub available: Amount,
    /// May be negative: the preview shows what a withdrawal would leave
    pub remaining: Amount,
    pub bank_name: String,
    pub masked_account_number: String,
    pub routing_code: String,
}

/// Owns the wallet's balance and its history.
///
/// Every operation validates fully before mutating anything, so a failed
/// operation leaves both balance and log exactly as they were.
#[derive(Debug, Clone)]
pub struct Ledger {
    balance: Balance,
    log: TransactionLog,
    rates: ExchangeRateTable,
    next_sequence: i64,
}

impl Ledger {
    /// A fresh wallet holding the seed balance and no history.
    pub fn new() -> Self {
        Self::restore(Balance::seed(), TransactionLog::new())
    }

    /// Rebuild a ledger from persisted state.
    pub fn restore(balance: Balance, log: TransactionLog) -> Self {
        let next_sequence = log.iter().map(|t| t.sequence).max().unwrap_or(0) + 1;
        Self {
            balance,
            log,
            rates: ExchangeRateTable::fixed(),
            next_sequence,
        }
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Credit `amount` of `currency`.
    pub fn add_funds(&mut self, amount: Amount, currency: Currency) -> Result<Committed, LedgerError> {
        check_amount(amount)?;
        self.check_credit(currency, amount, amount)?;

        self.balance.credit(currency, amount);
        debug!(amount, %currency, "Funds added");

        Ok(self.commit(TransactionRecord::Add { amount, currency }))
    }

    /// Debit `amount` of `currency` towards the given bank account.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        currency: Currency,
        bank_details: BankDetails,
    ) -> Result<Committed, LedgerError> {
        if let Some(field) = bank_details.missing_field() {
            return Err(LedgerError::InvalidBankDetails(field));
        }
        check_amount(amount)?;
        self.check_funds(currency, amount)?;

        self.balance.debit(currency, amount);
        debug!(amount, %currency, bank = %bank_details.bank_name, "Funds withdrawn");

        Ok(self.commit(TransactionRecord::Withdraw {
            amount,
            currency,
            bank_details,
        }))
    }

    /// Move `amount` of `from` into `to` at the fixed rate.
    /// The converted amount is credited unrounded.
    pub fn exchange(
        &mut self,
        amount: Amount,
        from: Currency,
        to: Currency,
    ) -> Result<Committed, LedgerError> {
        check_amount(amount)?;
        if from == to {
            return Err(LedgerError::SameCurrency(from));
        }
        self.check_funds(from, amount)?;

        let converted_amount = self.rates.convert(amount, from, to);
        self.check_credit(to, converted_amount, amount)?;
        self.balance.debit(from, amount);
        self.balance.credit(to, converted_amount);
        debug!(amount, %from, %to, converted_amount, "Currency exchanged");

        Ok(self.commit(TransactionRecord::Exchange {
            amount,
            currency: from,
            to_currency: to,
            converted_amount,
        }))
    }

    /// What exchanging `amount` would yield, without touching the balance.
    /// Insufficient funds are reported in the quote rather than refused.
    pub fn quote_exchange(
        &self,
        amount: Amount,
        from: Currency,
        to: Currency,
    ) -> Result<ExchangeQuote, LedgerError> {
        check_amount(amount)?;
        if from == to {
            return Err(LedgerError::SameCurrency(from));
        }
        let converted_amount = self.rates.convert(amount, from, to);
        if !converted_amount.is_finite() {
            return Err(LedgerError::InvalidAmount {
                amount,
                reason: InvalidAmount::Overflow,
            });
        }
        Ok(ExchangeQuote {
            amount,
            from,
            to,
            converted_amount,
            rate: self.rates.rate(from, to),
            sufficient_funds: self.balance.covers(from, amount),
        })
    }

    pub fn preview_withdrawal(
        &self,
        amount: Amount,
        currency: Currency,
        bank_details: &BankDetails,
    ) -> Result<WithdrawalPreview, LedgerError> {
        if let Some(field) = bank_details.missing_field() {
            return Err(LedgerError::InvalidBankDetails(field));
        }
        check_amount(amount)?;
        let available = self.balance.get(currency);
        Ok(WithdrawalPreview {
            amount,
            currency,
            available,
            remaining: available - amount,
            bank_name: bank_details.bank_name.clone(),
            masked_account_number: bank_details.masked_account_number(),
            routing_code: bank_details.routing_code.clone(),
        })
    }

    /// Restore the seed balance and drop all history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn check_funds(&self, currency: Currency, required: Amount) -> Result<(), LedgerError> {
        if !self.balance.covers(currency, required) {
            return Err(LedgerError::InsufficientFunds {
                currency,
                available: self.balance.get(currency),
                required,
            });
        }
        Ok(())
    }

    /// Crediting `credit` must leave a finite balance. `amount` is the
    /// operation amount reported back on failure.
    fn check_credit(
        &self,
        currency: Currency,
        credit: Amount,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if (self.balance.get(currency) + credit).is_finite() {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount {
                amount,
                reason: InvalidAmount::Overflow,
            })
        }
    }

    fn commit(&mut self, record: TransactionRecord) -> Committed {
        let transaction = Transaction::completed(self.next_sequence, record, Utc::now());
        self.next_sequence += 1;
        self.log.append(transaction.clone());

        Committed {
            balance: self.balance,
            transaction,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_amount(amount: Amount) -> Result<(), LedgerError> {
    validate_amount(amount).map_err(|reason| LedgerError::InvalidAmount { amount, reason })
}
