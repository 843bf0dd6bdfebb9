//! Postgres store implementations
//!
//! Backing storage for the running service. Schema lives in the
//! migrations/ directory as raw SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::{Account, Amount, Balance, TransactionKind, TransactionRecord, User};

use super::{AccountStore, StoreError, TransactionLog, UserStore};

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    let balance: Decimal = row.try_get("balance")?;
    Ok(Account {
        id: row.try_get("id")?,
        balance: Balance::new(balance)
            .map_err(|e| StoreError::Corrupt(format!("account balance: {e}")))?,
        currency: row.try_get("currency")?,
        owner_id: row.try_get("owner_id")?,
    })
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT id, balance, currency, owner_id FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn save(&self, account: &Account) -> Result<Account, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, balance, currency, owner_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET balance = EXCLUDED.balance
            "#,
        )
        .bind(account.id)
        .bind(account.balance.value())
        .bind(&account.currency)
        .bind(account.owner_id)
        .execute(&self.pool)
        .await?;

        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, balance, currency, owner_id FROM accounts WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query("SELECT id, balance, currency, owner_id FROM accounts")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(account_from_row).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgTransactionLog {
    pool: PgPool,
}

impl PgTransactionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<TransactionRecord, StoreError> {
    let tx_type: String = row.try_get("tx_type")?;
    let from_account: Option<Uuid> = row.try_get("from_account")?;
    let to_account: Option<Uuid> = row.try_get("to_account")?;

    let kind = match (tx_type.as_str(), from_account, to_account) {
        ("TRANSFER", Some(from), Some(to)) => TransactionKind::Transfer { from, to },
        ("DEPOSIT", None, Some(to)) => TransactionKind::Deposit { to },
        ("DEBIT", Some(from), None) => TransactionKind::Debit { from },
        _ => {
            return Err(StoreError::Corrupt(format!(
                "transaction type {tx_type} with from={from_account:?} to={to_account:?}"
            )))
        }
    };

    let amount: Decimal = row.try_get("amount")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(TransactionRecord {
        id: row.try_get("id")?,
        created_at,
        kind,
        amount: Amount::new(amount)
            .map_err(|e| StoreError::Corrupt(format!("transaction amount: {e}")))?,
        currency: row.try_get("currency")?,
    })
}

#[async_trait]
impl TransactionLog for PgTransactionLog {
    async fn append(&self, record: &TransactionRecord) -> Result<TransactionRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, created_at, tx_type, from_account, to_account, amount, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.created_at)
        .bind(record.kind.transaction_type().as_str())
        .bind(record.kind.from_account())
        .bind(record.kind.to_account())
        .bind(record.amount.value())
        .bind(&record.currency)
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }

    async fn find_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, tx_type, from_account, to_account, amount, currency
            FROM transactions
            WHERE from_account = $1 OR to_account = $1
            ORDER BY seq
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        last_name: row.try_get("last_name")?,
        first_name: row.try_get("first_name")?,
        patronymic_name: row.try_get("patronymic_name")?,
        birth_date: row.try_get("birth_date")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, last_name, first_name, patronymic_name, birth_date, email, phone_number
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, last_name, first_name, patronymic_name, birth_date, email, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                last_name = EXCLUDED.last_name,
                first_name = EXCLUDED.first_name,
                patronymic_name = EXCLUDED.patronymic_name,
                birth_date = EXCLUDED.birth_date,
                email = EXCLUDED.email,
                phone_number = EXCLUDED.phone_number
            "#,
        )
        .bind(user.id)
        .bind(&user.last_name)
        .bind(&user.first_name)
        .bind(&user.patronymic_name)
        .bind(user.birth_date)
        .bind(&user.email)
        .bind(&user.phone_number)
        .execute(&self.pool)
        .await?;

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, last_name, first_name, patronymic_name, birth_date, email, phone_number
            FROM users
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}
