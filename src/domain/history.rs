use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};

use super::{Transaction, TransactionStatus, TransactionType};

/// Append-only transaction history, newest first.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: VecDeque<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from transactions already ordered newest first.
    pub fn from_newest_first(transactions: Vec<Transaction>) -> Self {
        Self {
            entries: transactions.into(),
        }
    }

    /// Insert at the head. Existing entries are never touched.
    pub fn append(&mut self, transaction: Transaction) {
        self.entries.push_front(transaction);
    }

    /// The `n` most recent transactions, newest first.
    pub fn recent(&self, n: usize) -> Vec<&Transaction> {
        self.entries.iter().take(n).collect()
    }

    /// Transactions matching `filter`, keeping log order.
    pub fn filter(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        self.entries.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Transaction> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Criteria for narrowing the history view. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Inclusive, from the start of the day (UTC)
    pub from_date: Option<NaiveDate>,
    /// Inclusive, through the end of the day (UTC)
    pub to_date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// Case-insensitive substring over description, type, currencies and amount
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.from_date.is_none()
            && self.to_date.is_none()
            && self.transaction_type.is_none()
            && self.status.is_none()
            && self.search.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(from) = self.from_date {
            if transaction.timestamp < start_of_day(from) {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if transaction.timestamp > end_of_day(to) {
                return false;
            }
        }
        if let Some(kind) = self.transaction_type {
            if transaction.transaction_type() != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if transaction.status != status {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !searchable_text(transaction).contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn searchable_text(transaction: &Transaction) -> String {
    let to_currency = transaction
        .to_currency()
        .map(|c| c.as_str())
        .unwrap_or("");
    [
        transaction.description.as_str(),
        transaction.transaction_type().as_str(),
        transaction.currency().as_str(),
        to_currency,
        &transaction.amount().to_string(),
    ]
    .join(" ")
    .to_lowercase()
}
