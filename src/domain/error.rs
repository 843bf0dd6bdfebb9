//! Domain error taxonomy
//!
//! Every failure the engine and lifecycle services can produce, tagged by
//! kind so callers can map them to external responses. Nothing in here is
//! a bare string classification.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::rates::RateError;
use crate::store::StoreError;

use super::AmountError;

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    // Validation (terminal, no side effect)
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("cannot transfer to the same account")]
    TransferToSelf,

    #[error("currency code not supported: {0}")]
    UnsupportedCurrency(String),

    #[error("invalid user data: {0}")]
    InvalidUser(String),

    // Not found (terminal)
    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    // Business rules (terminal)
    #[error("insufficient funds on account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: Uuid,
        balance: Decimal,
        requested: Decimal,
    },

    // External dependency (retried internally, then surfaced)
    #[error(transparent)]
    Conversion(#[from] RateError),

    // Partial failure: a compensating mutation itself failed. The affected
    // account may be inconsistent until reconciled out of band.
    #[error("reconciliation required for account {account_id}: failed to restore {amount}: {reason}")]
    ReconciliationFailed {
        account_id: Uuid,
        amount: Decimal,
        reason: String,
    },

    // Collaborator failures
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the operation was aborted by caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Conversion(RateError::Cancelled))
    }
}
