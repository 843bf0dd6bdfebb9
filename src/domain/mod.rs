//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod amount;
pub mod error;
pub mod transaction;
pub mod user;

pub use account::Account;
pub use amount::{Amount, AmountError, Balance};
pub use error::DomainError;
pub use transaction::{TransactionKind, TransactionRecord, TransactionType};
pub use user::User;
