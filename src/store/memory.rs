//! In-memory store implementations
//!
//! Used by the test suite and by local experimentation. Maps behind
//! `std::sync::RwLock`; no await point is ever crossed while a lock is
//! held.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, TransactionRecord, User};

use super::{AccountStore, StoreError, TransactionLog, UserStore};

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().unwrap().get(&id).cloned())
    }

    async fn save(&self, account: &Account) -> Result<Account, StoreError> {
        self.accounts
            .write()
            .unwrap()
            .insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.accounts.write().unwrap().remove(&id);
        Ok(())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.read().unwrap().values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    records: RwLock<Vec<TransactionRecord>>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record appended so far, in append order.
    pub fn all(&self) -> Vec<TransactionRecord> {
        self.records.read().unwrap().clone()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, record: &TransactionRecord) -> Result<TransactionRecord, StoreError> {
        self.records.write().unwrap().push(record.clone());
        Ok(record.clone())
    }

    async fn find_by_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.kind.involves(account_id))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        self.users.write().unwrap().insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users.write().unwrap().remove(&id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().unwrap().values().cloned().collect())
    }
}
