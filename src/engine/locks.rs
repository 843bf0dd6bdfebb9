//! Per-account lock registry
//!
//! Serializes balance mutations per account identifier. Operations on
//! disjoint accounts proceed independently; there is no global lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of one async mutex per account id.
///
/// Entries are created on first use and kept for the life of the process;
/// the map is bounded by the number of distinct accounts touched.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for a single account.
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        self.lock_for(id).lock_owned().await
    }

    /// Acquire the locks for both endpoints of a transfer.
    ///
    /// Locks are always taken in id order, so two transfers over the same
    /// pair of accounts in opposite directions cannot deadlock.
    pub async fn acquire_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "transfer endpoints must differ");
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await;
        let second_guard = self.acquire(second).await;
        (first_guard, second_guard)
    }
}
