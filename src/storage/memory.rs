use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Balance, Transaction, User};

use super::WalletStore;

#[derive(Default)]
struct MemoryState {
    balance: Option<Balance>,
    transactions: VecDeque<Transaction>,
    user: Option<User>,
}

/// Ephemeral wallet store. Nothing survives the process.
///
/// Cloning yields a handle to the same underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn get_balance(&self) -> Result<Balance> {
        let state = self.inner.lock().await;
        Ok(state.balance.unwrap_or_else(Balance::seed))
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let state = self.inner.lock().await;
        Ok(state.transactions.iter().cloned().collect())
    }

    async fn commit(&self, balance: &Balance, transaction: &Transaction) -> Result<()> {
        let mut state = self.inner.lock().await;
        if !state.transactions.iter().any(|t| t.id == transaction.id) {
            if state
                .transactions
                .iter()
                .any(|t| t.sequence == transaction.sequence)
            {
                bail!(
                    "Transaction sequence {} is already taken",
                    transaction.sequence
                );
            }
            state.transactions.push_front(transaction.clone());
        }
        state.balance = Some(*balance);
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<User>> {
        let state = self.inner.lock().await;
        Ok(state.user.clone())
    }

    async fn set_user(&self, user: &User) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.user = Some(user.clone());
        Ok(())
    }

    async fn clear_user(&self) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.user = None;
        Ok(())
    }

    async fn clear_wallet(&self) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.balance = None;
        state.transactions.clear();
        Ok(())
    }
}
