use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Balance, Transaction, User};

use super::{keys, WalletStore, MIGRATION_001_INITIAL};

const UPSERT_VALUE: &str = r#"
    INSERT INTO kv_store (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

/// SQLite-backed wallet store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Open the database file at `path`, creating and migrating it if needed.
    pub async fn open(path: &str) -> Result<Self> {
        let store = Self::connect(&format!("sqlite:{}?mode=rwc", path)).await?;
        store.migrate().await?;
        debug!(path, "Opened wallet database");
        Ok(store)
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{}'", key))?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT_VALUE)
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove key '{}'", key))?;
        Ok(())
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let payload: String = row.get("payload");
        serde_json::from_str(&payload).context("Invalid stored transaction")
    }
}

#[async_trait]
impl WalletStore for SqliteStore {
    async fn get_balance(&self) -> Result<Balance> {
        match self.get_value(keys::BALANCE).await? {
            Some(json) => serde_json::from_str(&json).context("Invalid stored balance"),
            None => Ok(Balance::seed()),
        }
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query("SELECT payload FROM transactions ORDER BY sequence DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn commit(&self, balance: &Balance, transaction: &Transaction) -> Result<()> {
        let payload = serde_json::to_string(transaction)?;
        let balance_json = serde_json::to_string(balance)?;

        let mut tx = self.pool.begin().await.context("Failed to begin commit")?;

        sqlx::query(
            r#"
            INSERT INTO transactions (sequence, id, transaction_type, timestamp, payload)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(transaction.sequence)
        .bind(transaction.id.to_string())
        .bind(transaction.transaction_type().as_str())
        .bind(transaction.timestamp.to_rfc3339())
        .bind(&payload)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to save transaction {}", transaction.id))?;

        sqlx::query(UPSERT_VALUE)
            .bind(keys::BALANCE)
            .bind(&balance_json)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to save balance")?;

        tx.commit().await.context("Failed to commit transaction")?;
        debug!(id = %transaction.id, sequence = transaction.sequence, "Committed");
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<User>> {
        self.get_value(keys::USER)
            .await?
            .map(|json| serde_json::from_str(&json).context("Invalid stored user"))
            .transpose()
    }

    async fn set_user(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.set_value(keys::USER, &json).await
    }

    async fn clear_user(&self) -> Result<()> {
        self.remove_value(keys::USER).await
    }

    async fn clear_wallet(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin reset")?;

        sqlx::query("DELETE FROM transactions")
            .execute(&mut *tx)
            .await
            .context("Failed to clear transactions")?;
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(keys::BALANCE)
            .execute(&mut *tx)
            .await
            .context("Failed to clear balance")?;

        tx.commit().await.context("Failed to commit reset")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Currency, Ledger};

    async fn test_store() -> Result<(SqliteStore, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("wallet.db");
        let store = SqliteStore::open(db_path.to_str().unwrap()).await?;
        Ok((store, temp_dir))
    }

    #[tokio::test]
    async fn test_defaults_when_empty() -> Result<()> {
        let (store, _temp) = test_store().await?;

        assert_eq!(store.get_balance().await?, Balance::seed());
        assert!(store.get_transactions().await?.is_empty());
        assert!(store.get_user().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_saves_balance_with_transaction() -> Result<()> {
        let (store, _temp) = test_store().await?;
        let mut ledger = Ledger::new();

        let first = ledger.add_funds(3.5, Currency::Usd)?;
        store.commit(&first.balance, &first.transaction).await?;
        let second = ledger.add_funds(3.75, Currency::Usd)?;
        store.commit(&second.balance, &second.transaction).await?;

        assert_eq!(store.get_balance().await?.get(Currency::Usd), 7.25);
        assert_eq!(store.get_transactions().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_sequence_collision_rolls_back_balance() -> Result<()> {
        let (store, _temp) = test_store().await?;

        let stored = Ledger::new().add_funds(500.0, Currency::Inr)?;
        store.commit(&stored.balance, &stored.transaction).await?;

        // A different transaction claiming the same sequence number
        let stray = Ledger::new().add_funds(7.0, Currency::Gbp)?;
        assert_eq!(stray.transaction.sequence, stored.transaction.sequence);
        assert!(store.commit(&stray.balance, &stray.transaction).await.is_err());

        assert_eq!(store.get_balance().await?, stored.balance);
        let ids: Vec<_> = store.get_transactions().await?.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![stored.transaction.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_transactions_newest_first_and_idempotent() -> Result<()> {
        let (store, _temp) = test_store().await?;
        let mut ledger = Ledger::new();

        let first = ledger.add_funds(10.0, Currency::Inr)?;
        let second = ledger.exchange(100.0, Currency::Inr, Currency::Eur)?;

        store.commit(&first.balance, &first.transaction).await?;
        store.commit(&second.balance, &second.transaction).await?;
        store.commit(&second.balance, &second.transaction).await?;

        let ids: Vec<_> = store.get_transactions().await?.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.transaction.id, first.transaction.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_user_roundtrip_and_clear() -> Result<()> {
        let (store, _temp) = test_store().await?;
        let user = User::verified("9876543210");

        store.set_user(&user).await?;
        assert_eq!(store.get_user().await?, Some(user));

        store.clear_user().await?;
        assert!(store.get_user().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_wallet_keeps_user() -> Result<()> {
        let (store, _temp) = test_store().await?;
        let mut ledger = Ledger::new();
        let committed = ledger.add_funds(10.0, Currency::Gbp)?;

        store.set_user(&User::verified("9876543210")).await?;
        store.commit(&committed.balance, &committed.transaction).await?;

        store.clear_wallet().await?;

        assert_eq!(store.get_balance().await?, Balance::seed());
        assert!(store.get_transactions().await?.is_empty());
        assert!(store.get_user().await?.is_some());
        Ok(())
    }
}
