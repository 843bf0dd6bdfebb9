//! Account entity
//!
//! A balance-holding entity in a single currency, owned by one user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Balance;

/// A user's account.
///
/// The identifier, currency, and owner are immutable once the account is
/// created; the balance changes only through the balance ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub balance: Balance,
    /// ISO 4217 currency code, uppercase
    pub currency: String,
    pub owner_id: Uuid,
}

impl Account {
    /// Create a new account with a zero balance.
    pub fn new(owner_id: Uuid, currency: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            balance: Balance::zero(),
            currency,
            owner_id,
        }
    }

    /// Return a copy of the account with the given balance.
    pub fn with_balance(&self, balance: Balance) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}
