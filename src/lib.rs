//! money_transfer library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod rates;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

pub use domain::{Account, Amount, AmountError, Balance, DomainError};
pub use domain::{TransactionKind, TransactionRecord, TransactionType, User};
pub use engine::{AccountLocks, BalanceLedger, Delta, TransferEngine};
pub use rates::{CancelSource, CancelToken, CurrencyConverter, RateError, RetryPolicy};
