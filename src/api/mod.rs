//! API module
//!
//! HTTP layer: shared state and route definitions. Thin by design; all
//! business rules live in the engine and the lifecycle services.

pub mod routes;

use crate::engine::TransferEngine;
use crate::service::{AccountService, UserService};

/// Shared application state for the HTTP layer
#[derive(Clone)]
pub struct AppState {
    pub engine: TransferEngine,
    pub accounts: AccountService,
    pub users: UserService,
}

pub use routes::create_router;
