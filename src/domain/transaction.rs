use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{round_display, Amount, Currency};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Add,
    Withdraw,
    Exchange,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Add => "add",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Exchange => "exchange",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "add" => Some(TransactionType::Add),
            "withdraw" => Some(TransactionType::Withdraw),
            "exchange" => Some(TransactionType::Exchange),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    /// Reserved for asynchronous backends; never produced locally.
    Pending,
    /// Reserved for asynchronous backends; never produced locally.
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Some(TransactionStatus::Completed),
            "pending" => Some(TransactionStatus::Pending),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination account of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    /// Routing number or IFSC code
    #[serde(alias = "ifscCode")]
    pub routing_code: String,
}

impl BankDetails {
    pub fn new(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        routing_code: impl Into<String>,
    ) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            routing_code: routing_code.into(),
        }
    }

    /// Name of the first required field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.bank_name.trim().is_empty() {
            Some("bank name")
        } else if self.account_number.trim().is_empty() {
            Some("account number")
        } else if self.routing_code.trim().is_empty() {
            Some("routing code")
        } else {
            None
        }
    }

    /// Account number with all but the last four characters hidden.
    pub fn masked_account_number(&self) -> String {
        let chars: Vec<char> = self.account_number.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("****{}", tail)
    }
}

/// What a transaction did. Only the fields meaningful for each kind exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionRecord {
    Add {
        amount: Amount,
        currency: Currency,
    },
    Withdraw {
        amount: Amount,
        currency: Currency,
        #[serde(rename = "bankDetails")]
        bank_details: BankDetails,
    },
    Exchange {
        amount: Amount,
        currency: Currency,
        #[serde(rename = "toCurrency")]
        to_currency: Currency,
        #[serde(rename = "convertedAmount")]
        converted_amount: Amount,
    },
}

/// An immutable record of one committed ledger operation.
/// Corrections are never made in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing per wallet, assigned by the ledger
    pub sequence: i64,
    pub status: TransactionStatus,
    /// When the operation was committed
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(flatten)]
    pub record: TransactionRecord,
}

impl Transaction {
    /// Create a completed transaction. Description is derived from the record.
    pub(crate) fn completed(sequence: i64, record: TransactionRecord, timestamp: DateTime<Utc>) -> Self {
        let description = describe(&record);
        Self {
            id: Uuid::new_v4(),
            sequence,
            status: TransactionStatus::Completed,
            timestamp,
            description,
            record,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self.record {
            TransactionRecord::Add { .. } => TransactionType::Add,
            TransactionRecord::Withdraw { .. } => TransactionType::Withdraw,
            TransactionRecord::Exchange { .. } => TransactionType::Exchange,
        }
    }

    /// Amount in the source currency (always positive).
    pub fn amount(&self) -> Amount {
        match self.record {
            TransactionRecord::Add { amount, .. }
            | TransactionRecord::Withdraw { amount, .. }
            | TransactionRecord::Exchange { amount, .. } => amount,
        }
    }

    /// Source currency.
    pub fn currency(&self) -> Currency {
        match self.record {
            TransactionRecord::Add { currency, .. }
            | TransactionRecord::Withdraw { currency, .. }
            | TransactionRecord::Exchange { currency, .. } => currency,
        }
    }

    /// Destination currency; exchanges only.
    pub fn to_currency(&self) -> Option<Currency> {
        match self.record {
            TransactionRecord::Exchange { to_currency, .. } => Some(to_currency),
            _ => None,
        }
    }

    /// Amount credited in the destination currency; exchanges only.
    pub fn converted_amount(&self) -> Option<Amount> {
        match self.record {
            TransactionRecord::Exchange {
                converted_amount, ..
            } => Some(converted_amount),
            _ => None,
        }
    }

    /// Bank the funds went to; withdrawals only.
    pub fn bank_details(&self) -> Option<&BankDetails> {
        match &self.record {
            TransactionRecord::Withdraw { bank_details, .. } => Some(bank_details),
            _ => None,
        }
    }
}

fn describe(record: &TransactionRecord) -> String {
    match record {
        TransactionRecord::Add { amount, currency } => {
            format!("Added {} {} to wallet", amount, currency)
        }
        TransactionRecord::Withdraw { bank_details, .. } => {
            format!("Withdrawal to {}", bank_details.bank_name)
        }
        TransactionRecord::Exchange {
            amount,
            currency,
            to_currency,
            converted_amount,
        } => format!(
            "Exchanged {} {} to {:.2} {}",
            amount,
            currency,
            round_display(*converted_amount),
            to_currency
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bank() -> BankDetails {
        BankDetails::new("State Bank", "123456789012", "SBIN0001234")
    }

    #[test]
    fn test_add_description() {
        let tx = Transaction::completed(
            1,
            TransactionRecord::Add {
                amount: 500.0,
                currency: Currency::Inr,
            },
            Utc::now(),
        );
        assert_eq!(tx.description, "Added 500 INR to wallet");
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.transaction_type(), TransactionType::Add);
        assert!(tx.to_currency().is_none());
        assert!(tx.bank_details().is_none());
    }

    #[test]
    fn test_withdraw_description() {
        let tx = Transaction::completed(
            1,
            TransactionRecord::Withdraw {
                amount: 200.0,
                currency: Currency::Inr,
                bank_details: sample_bank(),
            },
            Utc::now(),
        );
        assert_eq!(tx.description, "Withdrawal to State Bank");
        assert_eq!(tx.bank_details(), Some(&sample_bank()));
    }

    #[test]
    fn test_exchange_description_rounds_converted_amount() {
        let tx = Transaction::completed(
            1,
            TransactionRecord::Exchange {
                amount: 100.0,
                currency: Currency::Inr,
                to_currency: Currency::Usd,
                converted_amount: 1.2000000000000002,
            },
            Utc::now(),
        );
        assert_eq!(tx.description, "Exchanged 100 INR to 1.20 USD");
        assert_eq!(tx.to_currency(), Some(Currency::Usd));
        assert_eq!(tx.converted_amount(), Some(1.2000000000000002));
    }

    #[test]
    fn test_bank_details_missing_field() {
        assert_eq!(sample_bank().missing_field(), None);
        assert_eq!(
            BankDetails::new("  ", "1", "X").missing_field(),
            Some("bank name")
        );
        assert_eq!(
            BankDetails::new("Bank", "", "X").missing_field(),
            Some("account number")
        );
        assert_eq!(
            BankDetails::new("Bank", "1", "\t").missing_field(),
            Some("routing code")
        );
    }

    #[test]
    fn test_masked_account_number() {
        assert_eq!(sample_bank().masked_account_number(), "****9012");
        assert_eq!(
            BankDetails::new("B", "12", "X").masked_account_number(),
            "****12"
        );
    }

    #[test]
    fn test_json_uses_flat_tagged_shape() {
        let tx = Transaction::completed(
            7,
            TransactionRecord::Exchange {
                amount: 100.0,
                currency: Currency::Inr,
                to_currency: Currency::Eur,
                converted_amount: 1.1,
            },
            Utc::now(),
        );
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "exchange");
        assert_eq!(value["currency"], "INR");
        assert_eq!(value["toCurrency"], "EUR");
        assert_eq!(value["status"], "completed");
        assert!(value.get("bankDetails").is_none());

        let parsed: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn test_type_and_status_parse() {
        assert_eq!(
            TransactionType::from_str("Withdraw"),
            Some(TransactionType::Withdraw)
        );
        assert_eq!(TransactionType::from_str("all"), None);
        assert_eq!(
            TransactionStatus::from_str("pending"),
            Some(TransactionStatus::Pending)
        );
    }
}
