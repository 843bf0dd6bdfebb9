//! Transfer Engine
//!
//! Orchestrates transfers, deposits, and debits: validation, currency
//! conversion, serialized balance mutation, and the append of exactly one
//! immutable transaction record per successful operation.
//!
//! A transfer walks Validated -> AccountsLoaded -> Converted ->
//! SourceDebited -> DestinationCredited -> Recorded; every state past the
//! conversion carries a compensating action that restores the already
//! applied mutations before the error is returned.

pub mod ledger;
pub mod locks;

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Account, Amount, DomainError, TransactionRecord};
use crate::rates::{CancelToken, CurrencyConverter};
use crate::store::{AccountStore, TransactionLog};

pub use ledger::{BalanceLedger, Delta};
pub use locks::AccountLocks;

/// The transfer orchestration engine.
///
/// Cheap to clone; all state is shared behind `Arc`s.
#[derive(Clone)]
pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
    converter: CurrencyConverter,
    ledger: BalanceLedger,
    locks: Arc<AccountLocks>,
}

/// Run an engine critical section on a detached task.
///
/// Once a debit has been applied, the operation owns its compensating
/// action: a caller dropping the future (client disconnect, timeout) must
/// not be able to interrupt mutation or compensation half way.
async fn shielded<T, F>(fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(e) => Err(DomainError::Internal(format!("engine task failed: {e}"))),
    }
}

impl TransferEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
        converter: CurrencyConverter,
    ) -> Self {
        Self {
            ledger: BalanceLedger::new(Arc::clone(&accounts)),
            accounts,
            log,
            converter,
            locks: Arc::new(AccountLocks::new()),
        }
    }

    async fn load_account(&self, id: Uuid) -> Result<Account, DomainError> {
        self.accounts
            .get(id)
            .await?
            .ok_or(DomainError::AccountNotFound(id))
    }

    /// Move `amount` (denominated in the source account's currency) from
    /// one account to another, converting between currencies when they
    /// differ.
    ///
    /// Conversion happens before any mutation, so no account lock is held
    /// across the rate service round trip and cancellation during the
    /// retry wait leaves both balances untouched.
    pub async fn transfer(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        amount: Decimal,
        cancel: &CancelToken,
    ) -> Result<TransactionRecord, DomainError> {
        if from_id == to_id {
            return Err(DomainError::TransferToSelf);
        }
        let amount = Amount::new(amount)?;

        let from = self.load_account(from_id).await?;
        let to = self.load_account(to_id).await?;

        let converted_raw = self
            .converter
            .convert(amount.value(), &from.currency, &to.currency, cancel)
            .await?;
        let converted = Amount::from_converted(converted_raw)?;

        let engine = self.clone();
        shielded(async move { engine.apply_transfer(from, to, amount, converted).await }).await
    }

    /// Credit `amount` (in the destination account's currency) to an
    /// account.
    pub async fn deposit(
        &self,
        to_id: Uuid,
        amount: Decimal,
    ) -> Result<TransactionRecord, DomainError> {
        let amount = Amount::new(amount)?;
        let account = self.load_account(to_id).await?;

        let engine = self.clone();
        shielded(async move {
            let _guard = engine.locks.acquire(account.id).await;
            engine
                .ledger
                .apply_delta(account.id, Delta::Credit, amount)
                .await?;

            let record = TransactionRecord::deposit(account.id, amount, &account.currency);
            if let Err(append_err) = engine.log.append(&record).await {
                return Err(engine
                    .compensate(account.id, Delta::Debit, amount, append_err.into())
                    .await);
            }
            Ok(record)
        })
        .await
    }

    /// Debit `amount` (in the source account's currency) from an account.
    pub async fn debit(
        &self,
        from_id: Uuid,
        amount: Decimal,
    ) -> Result<TransactionRecord, DomainError> {
        let amount = Amount::new(amount)?;
        let account = self.load_account(from_id).await?;

        let engine = self.clone();
        shielded(async move {
            let _guard = engine.locks.acquire(account.id).await;
            engine
                .ledger
                .apply_delta(account.id, Delta::Debit, amount)
                .await?;

            let record = TransactionRecord::debit(account.id, amount, &account.currency);
            if let Err(append_err) = engine.log.append(&record).await {
                return Err(engine
                    .compensate(account.id, Delta::Credit, amount, append_err.into())
                    .await);
            }
            Ok(record)
        })
        .await
    }

    /// Debit-credit-record critical section of a transfer. Both account
    /// locks are held throughout, so per-account record order matches the
    /// order balance mutations were applied.
    async fn apply_transfer(
        &self,
        from: Account,
        to: Account,
        amount: Amount,
        converted: Amount,
    ) -> Result<TransactionRecord, DomainError> {
        let _guards = self.locks.acquire_pair(from.id, to.id).await;

        self.ledger
            .apply_delta(from.id, Delta::Debit, amount)
            .await?;

        if let Err(credit_err) = self.ledger.apply_delta(to.id, Delta::Credit, converted).await {
            return Err(self
                .compensate(from.id, Delta::Credit, amount, credit_err)
                .await);
        }

        let record = TransactionRecord::transfer(from.id, to.id, amount, &from.currency);
        if let Err(append_err) = self.log.append(&record).await {
            // Reverse both mutations before surfacing the failure.
            if let Err(reverse_err) = self
                .ledger
                .apply_delta(to.id, Delta::Debit, converted)
                .await
            {
                return Err(self.reconciliation_failure(to.id, converted, reverse_err, &append_err.into()));
            }
            return Err(self
                .compensate(from.id, Delta::Credit, amount, append_err.into())
                .await);
        }

        Ok(record)
    }

    /// Apply a compensating delta after a later step failed. Returns the
    /// error to propagate: the original failure when compensation
    /// succeeded, or a reconciliation error when it did not.
    async fn compensate(
        &self,
        account_id: Uuid,
        delta: Delta,
        amount: Amount,
        original: DomainError,
    ) -> DomainError {
        match self.ledger.apply_delta(account_id, delta, amount).await {
            Ok(_) => {
                tracing::warn!(
                    %account_id,
                    %amount,
                    error = %original,
                    "operation failed after mutation, balance restored"
                );
                original
            }
            Err(comp_err) => self.reconciliation_failure(account_id, amount, comp_err, &original),
        }
    }

    fn reconciliation_failure(
        &self,
        account_id: Uuid,
        amount: Amount,
        comp_err: DomainError,
        original: &DomainError,
    ) -> DomainError {
        tracing::error!(
            %account_id,
            %amount,
            error = %comp_err,
            original = %original,
            "compensation failed, account requires manual reconciliation"
        );
        DomainError::ReconciliationFailed {
            account_id,
            amount: amount.value(),
            reason: format!("{comp_err} (original failure: {original})"),
        }
    }
}
