//! Account lifecycle service
//!
//! Creation validates the currency against the gateway's supported set
//! and resolves the owning user; deletion settles any positive balance
//! through the engine (recorded as a DEBIT transaction) before removing
//! the record, so deletion is never silently lossy.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, DomainError, TransactionRecord};
use crate::engine::TransferEngine;
use crate::rates::{CancelToken, CurrencyConverter};
use crate::store::{AccountStore, TransactionLog, UserStore};

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    users: Arc<dyn UserStore>,
    log: Arc<dyn TransactionLog>,
    engine: TransferEngine,
    converter: CurrencyConverter,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        users: Arc<dyn UserStore>,
        log: Arc<dyn TransactionLog>,
        engine: TransferEngine,
        converter: CurrencyConverter,
    ) -> Self {
        Self {
            accounts,
            users,
            log,
            engine,
            converter,
        }
    }

    /// Open a new account with a zero balance.
    pub async fn create_account(
        &self,
        owner_id: Uuid,
        currency: &str,
    ) -> Result<Account, DomainError> {
        let code = currency.to_uppercase();
        let supported = self
            .converter
            .supported_currencies(&CancelToken::never())
            .await?;
        if !supported.contains_key(&code) {
            return Err(DomainError::UnsupportedCurrency(code));
        }

        let owner = self
            .users
            .get(owner_id)
            .await?
            .ok_or(DomainError::UserNotFound(owner_id))?;

        let account = Account::new(owner.id, code);
        let account = self.accounts.save(&account).await?;
        tracing::info!(
            account_id = %account.id,
            currency = %account.currency,
            owner_id = %account.owner_id,
            "account created"
        );
        Ok(account)
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Account, DomainError> {
        self.accounts
            .get(id)
            .await?
            .ok_or(DomainError::AccountNotFound(id))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, DomainError> {
        Ok(self.accounts.list().await?)
    }

    /// Close an account. A positive balance is debited in full first and
    /// recorded in the transaction log.
    pub async fn delete_account(&self, id: Uuid) -> Result<(), DomainError> {
        let account = self.get_account(id).await?;

        let balance = account.balance.value();
        if balance > rust_decimal::Decimal::ZERO {
            self.engine.debit(account.id, balance).await?;
        }

        self.accounts.delete(account.id).await?;
        tracing::info!(account_id = %account.id, settled = %balance, "account deleted");
        Ok(())
    }

    /// Transaction history for one account, in ledger order.
    pub async fn account_transactions(
        &self,
        id: Uuid,
    ) -> Result<Vec<TransactionRecord>, DomainError> {
        // The account must currently exist; history of deleted accounts
        // stays readable through the log itself.
        self.get_account(id).await?;
        Ok(self.log.find_by_account(id).await?)
    }

    pub async fn supported_currencies(&self) -> Result<HashMap<String, String>, DomainError> {
        Ok(self
            .converter
            .supported_currencies(&CancelToken::never())
            .await?)
    }
}
