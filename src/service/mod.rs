//! Lifecycle services
//!
//! Account and user lifecycle on top of the engine and the stores.

pub mod accounts;
pub mod users;
pub mod validation;

pub use accounts::AccountService;
pub use users::{UserFields, UserService};
