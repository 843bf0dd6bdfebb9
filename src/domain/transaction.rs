//! Transaction records
//!
//! Immutable audit records of balance-affecting operations. A record is
//! created exactly once per successful ledger operation and is never
//! mutated or deleted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Amount;

/// The three operations that produce a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Transfer,
    Deposit,
    Debit,
}

impl TransactionType {
    /// Stable string form used for persistence and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

/// Which accounts a transaction touches.
///
/// A closed set of shapes: a transfer always has both endpoints, a deposit
/// has no source, a debit has no destination. Invalid combinations are
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Transfer { from: Uuid, to: Uuid },
    Deposit { to: Uuid },
    Debit { from: Uuid },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Transfer { .. } => TransactionType::Transfer,
            TransactionKind::Deposit { .. } => TransactionType::Deposit,
            TransactionKind::Debit { .. } => TransactionType::Debit,
        }
    }

    /// Source account, if the operation has one.
    pub fn from_account(&self) -> Option<Uuid> {
        match self {
            TransactionKind::Transfer { from, .. } | TransactionKind::Debit { from } => Some(*from),
            TransactionKind::Deposit { .. } => None,
        }
    }

    /// Destination account, if the operation has one.
    pub fn to_account(&self) -> Option<Uuid> {
        match self {
            TransactionKind::Transfer { to, .. } | TransactionKind::Deposit { to } => Some(*to),
            TransactionKind::Debit { .. } => None,
        }
    }

    /// Whether the given account appears on either side.
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.from_account() == Some(account_id) || self.to_account() == Some(account_id)
    }
}

/// An immutable audit record.
///
/// The amount is denominated in the source account's currency for
/// TRANSFER and DEBIT, and in the destination account's currency for
/// DEPOSIT. The currency code is a snapshot taken at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub currency: String,
}

impl TransactionRecord {
    fn new(kind: TransactionKind, amount: Amount, currency: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            kind,
            amount,
            currency: currency.to_string(),
        }
    }

    /// Record a transfer; amount in the source account's currency.
    pub fn transfer(from: Uuid, to: Uuid, amount: Amount, currency: &str) -> Self {
        Self::new(TransactionKind::Transfer { from, to }, amount, currency)
    }

    /// Record a deposit; amount in the destination account's currency.
    pub fn deposit(to: Uuid, amount: Amount, currency: &str) -> Self {
        Self::new(TransactionKind::Deposit { to }, amount, currency)
    }

    /// Record a debit; amount in the source account's currency.
    pub fn debit(from: Uuid, amount: Amount, currency: &str) -> Self {
        Self::new(TransactionKind::Debit { from }, amount, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn test_transfer_has_both_endpoints() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let record = TransactionRecord::transfer(from, to, amount(dec!(40)), "USD");

        assert_eq!(record.kind.transaction_type(), TransactionType::Transfer);
        assert_eq!(record.kind.from_account(), Some(from));
        assert_eq!(record.kind.to_account(), Some(to));
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn test_deposit_has_no_source() {
        let to = Uuid::new_v4();
        let record = TransactionRecord::deposit(to, amount(dec!(10)), "EUR");

        assert_eq!(record.kind.from_account(), None);
        assert_eq!(record.kind.to_account(), Some(to));
    }

    #[test]
    fn test_debit_has_no_destination() {
        let from = Uuid::new_v4();
        let record = TransactionRecord::debit(from, amount(dec!(10)), "USD");

        assert_eq!(record.kind.from_account(), Some(from));
        assert_eq!(record.kind.to_account(), None);
    }

    #[test]
    fn test_involves() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let other = Uuid::new_v4();
        let record = TransactionRecord::transfer(from, to, amount(dec!(1)), "USD");

        assert!(record.kind.involves(from));
        assert!(record.kind.involves(to));
        assert!(!record.kind.involves(other));
    }

    #[test]
    fn test_created_at_not_in_future() {
        let record = TransactionRecord::deposit(Uuid::new_v4(), amount(dec!(1)), "USD");
        assert!(record.created_at <= Utc::now());
    }
}
