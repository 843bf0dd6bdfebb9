//! Storage collaborators
//!
//! Interfaces for the persistent account store, the append-only
//! transaction log, and the user store. The traits are storage-agnostic;
//! Postgres implementations back the running service and in-memory
//! implementations back the tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, TransactionRecord, User};

pub use memory::{InMemoryAccountStore, InMemoryTransactionLog, InMemoryUserStore};
pub use postgres::{PgAccountStore, PgTransactionLog, PgUserStore};

/// Errors surfaced by storage collaborators
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row violated a domain invariant on read.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Keyed storage of accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Insert or update an account, returning the stored value.
    async fn save(&self, account: &Account) -> Result<Account, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// All accounts owned by the given user.
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError>;

    async fn list(&self) -> Result<Vec<Account>, StoreError>;
}

/// Append-only log of transaction records.
///
/// Records are never mutated or deleted; `append` is the only write path.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append(&self, record: &TransactionRecord) -> Result<TransactionRecord, StoreError>;

    /// Records touching the given account on either side, in append order.
    async fn find_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Keyed storage of users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn save(&self, user: &User) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}
