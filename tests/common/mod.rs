// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use billfold::application::WalletService;
use billfold::domain::{Balance, BankDetails, Transaction, User};
use billfold::storage::{MemoryStore, SqliteStore, WalletStore};
use tempfile::TempDir;

pub const MOBILE: &str = "9876543210";
pub const OTP: &str = "1234";

/// Path of a wallet database inside `dir`.
pub fn db_path(dir: &TempDir) -> String {
    dir.path().join("wallet.db").to_str().unwrap().to_string()
}

/// Helper to create a signed-in service backed by a temporary database
pub async fn test_service() -> Result<(WalletService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let mut service = WalletService::open_path(&db_path(&temp_dir)).await?;
    service.login(MOBILE, OTP).await?;
    Ok((service, temp_dir))
}

pub fn hdfc() -> BankDetails {
    BankDetails::new("HDFC Bank", "50100012345678", "HDFC0000123")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// A memory store whose writes can be switched off to simulate an outage.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    offline: Arc<AtomicBool>,
    fail_next_clear: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `clear_wallet` fail, leaving other writes working.
    pub fn fail_next_clear(&self) {
        self.fail_next_clear.store(true, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("storage unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl WalletStore for FlakyStore {
    async fn get_balance(&self) -> Result<Balance> {
        self.inner.get_balance().await
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.inner.get_transactions().await
    }

    async fn commit(&self, balance: &Balance, transaction: &Transaction) -> Result<()> {
        self.check()?;
        self.inner.commit(balance, transaction).await
    }

    async fn get_user(&self) -> Result<Option<User>> {
        self.inner.get_user().await
    }

    async fn set_user(&self, user: &User) -> Result<()> {
        self.check()?;
        self.inner.set_user(user).await
    }

    async fn clear_user(&self) -> Result<()> {
        self.check()?;
        self.inner.clear_user().await
    }

    async fn clear_wallet(&self) -> Result<()> {
        self.check()?;
        if self.fail_next_clear.swap(false, Ordering::SeqCst) {
            bail!("storage unavailable");
        }
        self.inner.clear_wallet().await
    }
}
