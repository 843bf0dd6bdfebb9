//! Balance Ledger
//!
//! The only code path that changes an account balance. Enforces the
//! non-negative-balance invariant before any debit is persisted.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, Amount, DomainError};
use crate::store::AccountStore;

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Credit,
    Debit,
}

/// Applies debits and credits to single accounts.
///
/// The check-then-mutate sequence is not internally synchronized; callers
/// hold the account's lock from [`AccountLocks`](super::AccountLocks) for
/// the duration of the call.
#[derive(Clone)]
pub struct BalanceLedger {
    accounts: Arc<dyn AccountStore>,
}

impl BalanceLedger {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Apply a single balance change and persist the updated account.
    ///
    /// A debit that would take the balance below zero fails with
    /// `InsufficientFunds` and performs no mutation.
    pub async fn apply_delta(
        &self,
        account_id: Uuid,
        delta: Delta,
        amount: Amount,
    ) -> Result<Account, DomainError> {
        let account = self
            .accounts
            .get(account_id)
            .await?
            .ok_or(DomainError::AccountNotFound(account_id))?;

        let balance = match delta {
            Delta::Credit => account.balance.credit(&amount)?,
            Delta::Debit => {
                if !account.balance.is_sufficient_for(&amount) {
                    return Err(DomainError::InsufficientFunds {
                        account_id,
                        balance: account.balance.value(),
                        requested: amount.value(),
                    });
                }
                account.balance.debit(&amount)?
            }
        };

        let updated = account.with_balance(balance);
        self.accounts.save(&updated).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Balance;
    use crate::store::InMemoryAccountStore;
    use rust_decimal_macros::dec;

    async fn ledger_with_account(balance: rust_decimal::Decimal) -> (BalanceLedger, Uuid) {
        let store = Arc::new(InMemoryAccountStore::new());
        let account = Account::new(Uuid::new_v4(), "USD".to_string())
            .with_balance(Balance::new(balance).unwrap());
        store.save(&account).await.unwrap();
        (BalanceLedger::new(store), account.id)
    }

    #[tokio::test]
    async fn test_credit_adds_unconditionally() {
        let (ledger, id) = ledger_with_account(dec!(0)).await;
        let account = ledger
            .apply_delta(id, Delta::Credit, Amount::new(dec!(25.50)).unwrap())
            .await
            .unwrap();
        assert_eq!(account.balance.value(), dec!(25.50));
    }

    #[tokio::test]
    async fn test_debit_of_exact_balance_reaches_zero() {
        let (ledger, id) = ledger_with_account(dec!(100)).await;
        let account = ledger
            .apply_delta(id, Delta::Debit, Amount::new(dec!(100)).unwrap())
            .await
            .unwrap();
        assert_eq!(account.balance.value(), dec!(0));
    }

    #[tokio::test]
    async fn test_overdraft_fails_without_mutation() {
        let (ledger, id) = ledger_with_account(dec!(100)).await;
        let err = ledger
            .apply_delta(id, Delta::Debit, Amount::new(dec!(100.01)).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientFunds { .. }));

        // Balance untouched
        let account = ledger
            .apply_delta(id, Delta::Debit, Amount::new(dec!(100)).unwrap())
            .await
            .unwrap();
        assert_eq!(account.balance.value(), dec!(0));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let store = Arc::new(InMemoryAccountStore::new());
        let ledger = BalanceLedger::new(store);
        let missing = Uuid::new_v4();

        let err = ledger
            .apply_delta(missing, Delta::Credit, Amount::new(dec!(1)).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountNotFound(id) if id == missing));
    }
}
