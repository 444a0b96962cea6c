mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Balance, Transaction, User};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Persistence for a single wallet: its balance snapshot, its history and
/// the signed-in user.
///
/// Stores are plain key-value collaborators. They never validate ledger
/// rules; they only keep what the ledger committed.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// The stored balance, or the seed balance if none was saved yet.
    async fn get_balance(&self) -> Result<Balance>;

    /// All transactions, newest first. Empty if none were saved yet.
    async fn get_transactions(&self) -> Result<Vec<Transaction>>;

    /// Insert `transaction` at the head of the history and store the
    /// balance it produced, as one atomic write: either both are saved or
    /// neither is. Committing a transaction that is already stored (same id)
    /// only rewrites the balance; another transaction holding the same
    /// sequence is an error.
    async fn commit(&self, balance: &Balance, transaction: &Transaction) -> Result<()>;

    async fn get_user(&self) -> Result<Option<User>>;

    async fn set_user(&self, user: &User) -> Result<()>;

    async fn clear_user(&self) -> Result<()>;

    /// Drop the balance and every transaction. The user is kept.
    async fn clear_wallet(&self) -> Result<()>;
}

/// Keys used in the key-value part of a store.
pub(crate) mod keys {
    pub const BALANCE: &str = "wallet_balance";
    pub const USER: &str = "wallet_user";
}
