//! Currency Conversion Gateway
//!
//! Wraps the external rate service with error classification and a
//! bounded, fixed-interval retry policy. Rate-limit responses (HTTP 429)
//! are retried after a short interval, server errors (HTTP >= 500) after
//! a long one; any other non-success response is terminal. The backoff
//! wait suspends only the calling operation and supports cooperative
//! cancellation.

pub mod cancel;
pub mod client;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

pub use cancel::{CancelSource, CancelToken};
pub use client::{HttpRateClient, RateSource};

/// Failures of the conversion gateway
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("rate service throttled the request (HTTP 429)")]
    RateLimited,

    #[error("rate service server error (HTTP {status})")]
    Server { status: u16 },

    /// Non-success response that is not worth retrying.
    #[error("rate service rejected the request (HTTP {status})")]
    Rejected { status: u16 },

    #[error("unreadable rate service response: {0}")]
    InvalidResponse(String),

    #[error("network error calling rate service: {0}")]
    Network(#[from] reqwest::Error),

    /// The retry budget was exhausted; carries the last retryable error.
    #[error("rate service unavailable after {attempts} attempts")]
    Unavailable {
        attempts: u32,
        #[source]
        last: Box<RateError>,
    },

    #[error("conversion cancelled by the caller")]
    Cancelled,
}

/// How the converter should respond to a failed attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retry after the short interval (rate limiting).
    ShortInterval,
    /// Retry after the long interval (server-side trouble).
    LongInterval,
    /// Don't retry; surface the error as-is.
    Terminal,
}

impl RateError {
    /// Classification per attempt. The interval is fixed by the status
    /// observed on that attempt, never adaptive.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            RateError::RateLimited => RetryClass::ShortInterval,
            RateError::Server { .. } | RateError::Network(_) => RetryClass::LongInterval,
            RateError::Rejected { .. }
            | RateError::InvalidResponse(_)
            | RateError::Unavailable { .. }
            | RateError::Cancelled => RetryClass::Terminal,
        }
    }
}

/// Retry policy for rate service calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget per call, including the first attempt.
    pub max_attempts: u32,
    /// Wait after an HTTP 429.
    pub short_interval: Duration,
    /// Wait after an HTTP >= 500.
    pub long_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            short_interval: Duration::from_secs(1),
            long_interval: Duration::from_secs(300),
        }
    }
}

/// Retrying facade over a [`RateSource`].
#[derive(Clone)]
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    policy: RetryPolicy,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Convert `amount` between currencies.
    ///
    /// Same-currency conversions return the amount unchanged without
    /// touching the rate service, so they carry no external failure mode.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        cancel: &CancelToken,
    ) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(amount);
        }

        self.with_retry(cancel, || self.source.convert(amount, from, to))
            .await
    }

    /// Supported currency codes mapped to display names. Goes through the
    /// same retry policy as conversions.
    pub async fn supported_currencies(
        &self,
        cancel: &CancelToken,
    ) -> Result<HashMap<String, String>, RateError> {
        self.with_retry(cancel, || self.source.supported_currencies())
            .await
    }

    /// Run one rate-service call under the retry policy. The attempt
    /// counter is local to this call; concurrent conversions never share
    /// retry state.
    async fn with_retry<T, F, Fut>(&self, cancel: &CancelToken, op: F) -> Result<T, RateError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RateError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(RateError::Cancelled);
            }

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let interval = match err.retry_class() {
                RetryClass::Terminal => return Err(err),
                RetryClass::ShortInterval => self.policy.short_interval,
                RetryClass::LongInterval => self.policy.long_interval,
            };

            if attempt >= self.policy.max_attempts {
                tracing::warn!(attempts = attempt, error = %err, "rate service retry budget exhausted");
                return Err(RateError::Unavailable {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            tracing::info!(
                attempt,
                wait_ms = interval.as_millis() as u64,
                error = %err,
                "rate service attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RateError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Rate source that plays back a fixed script of responses.
    struct ScriptedSource {
        script: Mutex<Vec<Result<Decimal, RateError>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Decimal, RateError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl RateSource for ScriptedSource {
        async fn convert(&self, amount: Decimal, _: &str, _: &str) -> Result<Decimal, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(amount)
            } else {
                script.remove(0)
            }
        }

        async fn supported_currencies(&self) -> Result<HashMap<String, String>, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HashMap::from([("USD".to_string(), "US Dollar".to_string())]))
        }
    }

    fn converter(source: Arc<ScriptedSource>, max_attempts: u32) -> CurrencyConverter {
        CurrencyConverter::new(
            source,
            RetryPolicy {
                max_attempts,
                ..RetryPolicy::default()
            },
        )
    }

    #[tokio::test]
    async fn test_same_currency_bypasses_rate_service() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let converter = converter(source.clone(), 20);

        let result = converter
            .convert(dec!(42.5), "USD", "USD", &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(result, dec!(42.5));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_then_succeeds() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(RateError::RateLimited),
            Err(RateError::RateLimited),
            Ok(dec!(36.00)),
        ]));
        let converter = converter(source.clone(), 20);

        let started = tokio::time::Instant::now();
        let result = converter
            .convert(dec!(40), "USD", "EUR", &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(result, dec!(36.00));
        assert_eq!(source.calls(), 3);
        // Two short-interval waits
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_exhaust_budget() {
        let source = Arc::new(ScriptedSource::new(
            (0..5).map(|_| Err(RateError::Server { status: 500 })).collect(),
        ));
        let converter = converter(source.clone(), 5);

        let err = converter
            .convert(dec!(40), "USD", "EUR", &CancelToken::never())
            .await
            .unwrap_err();

        assert!(matches!(err, RateError::Unavailable { attempts: 5, .. }));
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_client_error_is_terminal() {
        let source = Arc::new(ScriptedSource::new(vec![Err(RateError::Rejected {
            status: 404,
        })]));
        let converter = converter(source.clone(), 20);

        let err = converter
            .convert(dec!(40), "USD", "EUR", &CancelToken::never())
            .await
            .unwrap_err();

        assert!(matches!(err, RateError::Rejected { status: 404 }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let converter = converter(source.clone(), 20);

        let cancel = CancelSource::new();
        cancel.cancel();

        let err = converter
            .convert(dec!(40), "USD", "EUR", &cancel.token())
            .await
            .unwrap_err();

        assert!(matches!(err, RateError::Cancelled));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_backoff_wait() {
        let source = Arc::new(ScriptedSource::new(
            (0..100).map(|_| Err(RateError::RateLimited)).collect(),
        ));
        let converter = CurrencyConverter::new(
            source.clone(),
            RetryPolicy {
                max_attempts: 100,
                short_interval: Duration::from_secs(30),
                long_interval: Duration::from_secs(300),
            },
        );

        let cancel = CancelSource::new();
        let token = cancel.token();
        let handle = tokio::spawn(async move {
            converter.convert(dec!(40), "USD", "EUR", &token).await
        });

        // Let the first attempt fail and the wait begin, then cancel.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, RateError::Cancelled));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_class_mapping() {
        assert_eq!(RateError::RateLimited.retry_class(), RetryClass::ShortInterval);
        assert_eq!(
            RateError::Server { status: 503 }.retry_class(),
            RetryClass::LongInterval
        );
        assert_eq!(
            RateError::Rejected { status: 400 }.retry_class(),
            RetryClass::Terminal
        );
        assert_eq!(RateError::Cancelled.retry_class(), RetryClass::Terminal);
    }
}
