//! Cooperative cancellation
//!
//! A caller that wants to abandon an in-flight operation cancels through
//! a [`CancelSource`]; the converter observes the paired [`CancelToken`]
//! at attempt boundaries and during backoff waits. The engine deliberately
//! stops consulting the token once balance mutation begins, so a
//! compensating action can never be interrupted.

use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation handle held by the caller.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Token observed by the operation.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
            _keepalive: None,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    // Keeps the sender of a never-cancelled token alive.
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// A token that is never cancelled, for callers without a timeout.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is requested. If the source is dropped
    /// without cancelling, this pends forever.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_is_observed() {
        let source = CancelSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());

        source.cancel();
        assert!(token.is_cancelled());
        // Resolves immediately once cancelled
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_never_token_pends() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());

        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            token.cancelled(),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_dropped_source_is_not_cancellation() {
        let source = CancelSource::new();
        let token = source.token();
        drop(source);

        assert!(!token.is_cancelled());
        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            token.cancelled(),
        )
        .await;
        assert!(waited.is_err());
    }
}
