use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::domain::{
    authenticate, format_amount, is_valid_mobile, Amount, Balance, BankDetails, Committed,
    Currency, ExchangeQuote, Ledger, Transaction, TransactionFilter, TransactionLog, User,
    WithdrawalPreview,
};
use crate::storage::{SqliteStore, WalletStore};

use super::AppError;

/// How many transactions the dashboard shows by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Application service for one wallet session.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// Operations commit to the in-memory [`Ledger`] first and are then saved
/// to the store, each transaction together with the balance it produced.
/// If saving fails the ledger stays authoritative, the unsaved work is
/// kept in order, and [`WalletService::flush`] retries it.
pub struct WalletService<S: WalletStore> {
    store: S,
    ledger: Ledger,
    user: Option<User>,
    unsaved: VecDeque<Committed>,
}

impl WalletService<SqliteStore> {
    /// Open (creating if needed) the wallet database at the given path.
    pub async fn open_path(database_path: &str) -> Result<Self, AppError> {
        let store = SqliteStore::open(database_path).await?;
        Self::open(store).await
    }
}

impl<S: WalletStore> WalletService<S> {
    /// Load balance, history and session from `store`.
    pub async fn open(store: S) -> Result<Self, AppError> {
        let balance = store.get_balance().await?;
        let transactions = store.get_transactions().await?;
        let user = store.get_user().await?;
        debug!(
            transactions = transactions.len(),
            signed_in = user.is_some(),
            "Wallet loaded"
        );

        Ok(Self {
            store,
            ledger: Ledger::restore(balance, TransactionLog::from_newest_first(transactions)),
            user,
            unsaved: VecDeque::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========================
    // Session
    // ========================

    /// Sign in with a mobile number and the one-time code.
    pub async fn login(&mut self, mobile: &str, otp: &str) -> Result<User, AppError> {
        let mobile = mobile.trim();
        if !is_valid_mobile(mobile) {
            return Err(AppError::InvalidMobile(mobile.to_string()));
        }
        if !authenticate(mobile, otp) {
            return Err(AppError::InvalidOtp);
        }

        let user = User::verified(mobile);
        self.store.set_user(&user).await?;
        info!(user_id = %user.id, "Signed in");
        self.user = Some(user.clone());
        Ok(user)
    }

    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.store.clear_user().await?;
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "Signed out");
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_verified)
    }

    fn require_session(&self) -> Result<(), AppError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }

    // ========================
    // Balance
    // ========================

    pub fn balance(&self) -> &Balance {
        self.ledger.balance()
    }

    /// Balance of one currency with its symbol, e.g. "₹1000.00".
    pub fn formatted_balance(&self, currency: Currency) -> String {
        format_amount(self.balance().get(currency), currency)
    }

    // ========================
    // Ledger operations
    // ========================

    pub async fn add_funds(
        &mut self,
        amount: Amount,
        currency: Currency,
    ) -> Result<Committed, AppError> {
        self.require_session()?;
        let committed = self.ledger.add_funds(amount, currency)?;
        self.persist(committed).await
    }

    pub async fn withdraw(
        &mut self,
        amount: Amount,
        currency: Currency,
        bank_details: BankDetails,
    ) -> Result<Committed, AppError> {
        self.require_session()?;
        let committed = self.ledger.withdraw(amount, currency, bank_details)?;
        self.persist(committed).await
    }

    pub async fn exchange(
        &mut self,
        amount: Amount,
        from: Currency,
        to: Currency,
    ) -> Result<Committed, AppError> {
        self.require_session()?;
        let committed = self.ledger.exchange(amount, from, to)?;
        self.persist(committed).await
    }

    pub fn quote_exchange(
        &self,
        amount: Amount,
        from: Currency,
        to: Currency,
    ) -> Result<ExchangeQuote, AppError> {
        Ok(self.ledger.quote_exchange(amount, from, to)?)
    }

    pub fn preview_withdrawal(
        &self,
        amount: Amount,
        currency: Currency,
        bank_details: &BankDetails,
    ) -> Result<WithdrawalPreview, AppError> {
        Ok(self
            .ledger
            .preview_withdrawal(amount, currency, bank_details)?)
    }

    /// Restore the seed balance and erase the history, in the store and
    /// then in memory. Nothing changes if the store cannot be cleared.
    pub async fn reset(&mut self) -> Result<(), AppError> {
        self.require_session()?;
        if let Err(err) = self.store.clear_wallet().await {
            warn!(error = %err, "Failed to reset wallet");
            return Err(AppError::Persistence(err));
        }
        self.ledger.reset();
        self.unsaved.clear();
        info!("Wallet reset to seed balance");
        Ok(())
    }

    // ========================
    // History
    // ========================

    pub fn transactions(&self) -> &TransactionLog {
        self.ledger.log()
    }

    /// The `limit` most recent transactions, newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.ledger.log().recent(limit)
    }

    pub fn list_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        self.ledger.log().filter(filter)
    }

    // ========================
    // Persistence
    // ========================

    /// True when committed work has not reached the store yet.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.unsaved.is_empty()
    }

    /// Save any committed work the store has not confirmed yet, oldest first.
    pub async fn flush(&mut self) -> Result<(), AppError> {
        while let Some(committed) = self.unsaved.front() {
            let transaction = &committed.transaction;
            if let Err(err) = self.store.commit(&committed.balance, transaction).await {
                warn!(error = %err, id = %transaction.id, "Failed to save transaction");
                return Err(AppError::Persistence(err));
            }
            debug!(id = %transaction.id, balance = ?committed.balance, "Transaction saved");
            self.unsaved.pop_front();
        }
        Ok(())
    }

    async fn persist(&mut self, committed: Committed) -> Result<Committed, AppError> {
        self.unsaved.push_back(committed.clone());
        self.flush().await?;
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    async fn signed_in() -> WalletService<MemoryStore> {
        let mut service = WalletService::open(MemoryStore::new()).await.unwrap();
        service.login("9876543210", "1234").await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let mut service = WalletService::open(MemoryStore::new()).await.unwrap();
        let err = service.add_funds(10.0, Currency::Inr).await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(*service.balance(), Balance::seed());
    }

    #[tokio::test]
    async fn test_login_validation() {
        let mut service = WalletService::open(MemoryStore::new()).await.unwrap();

        let err = service.login("12345", "1234").await.unwrap_err();
        assert_eq!(err.code(), "invalid_mobile");

        let err = service.login("9876543210", "9999").await.unwrap_err();
        assert_eq!(err.code(), "invalid_otp");
        assert!(!service.is_authenticated());

        service.login("9876543210", "1234").await.unwrap();
        assert!(service.is_authenticated());

        service.logout().await.unwrap();
        assert!(service.current_user().is_none());
    }

    #[tokio::test]
    async fn test_committed_work_is_saved() {
        let mut service = signed_in().await;
        service.add_funds(500.0, Currency::Inr).await.unwrap();

        assert!(!service.has_unsaved_changes());
        let store = service.store();
        assert_eq!(store.get_balance().await.unwrap().get(Currency::Inr), 1500.0);
        assert_eq!(store.get_transactions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let store = MemoryStore::new();
        let mut service = WalletService::open(store.clone()).await.unwrap();
        service.login("9876543210", "1234").await.unwrap();
        service.exchange(100.0, Currency::Inr, Currency::Usd).await.unwrap();

        let reopened = WalletService::open(store).await.unwrap();
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.balance().get(Currency::Inr), 900.0);
        assert_eq!(reopened.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_formatted_balance() {
        let service = signed_in().await;
        assert_eq!(service.formatted_balance(Currency::Inr), "₹1000.00");
        assert_eq!(service.formatted_balance(Currency::Gbp), "£0.00");
    }
}
