//! Bounded, retrying execution of units of work.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{CoordinatorConfig, Result, SalesError};

/// Runs an operation attempt by attempt.
///
/// Each attempt is bounded by the transaction timeout. An attempt that ends
/// in a concurrency conflict is re-run from scratch until `max_attempts` is
/// reached; every other outcome is final. An attempt that times out is
/// dropped mid-flight, which discards its unit of work.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    max_attempts: u32,
    timeout: Duration,
    backoff: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(config: &CoordinatorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            timeout: config.transaction_timeout,
            backoff: config.retry_backoff,
        }
    }

    pub(crate) async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut tries = 0;

        let result = loop {
            tries += 1;

            let outcome = match tokio::time::timeout(self.timeout, attempt()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    metrics::counter!("sales_transaction_timeouts_total", "operation" => operation)
                        .increment(1);
                    Err(SalesError::Timeout {
                        operation,
                        after: self.timeout,
                    })
                }
            };

            match outcome {
                Err(SalesError::TransactionAbort(e)) if e.is_conflict() && tries < self.max_attempts => {
                    metrics::counter!("sales_transaction_retries_total", "operation" => operation)
                        .increment(1);
                    tracing::warn!(operation, attempt = tries, error = %e, "commit conflict, retrying");
                    tokio::time::sleep(self.backoff * tries).await;
                }
                other => break other,
            }
        };

        metrics::histogram!("sales_operation_duration_seconds", "operation" => operation)
            .record(started.elapsed().as_secs_f64());
        if let Err(e) = &result {
            tracing::debug!(operation, attempts = tries, error = %e, "operation aborted");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use common::EntityId;
    use store::{RecordKey, StoreError, Version};

    use super::*;

    fn conflict() -> SalesError {
        SalesError::TransactionAbort(StoreError::ConcurrencyConflict {
            key: RecordKey::new("sales", EntityId::new()),
            expected: Version::initial(),
            actual: Version::first(),
        })
    }

    fn policy(max_attempts: u32, timeout_ms: u64) -> RetryPolicy {
        RetryPolicy::new(&CoordinatorConfig {
            max_attempts,
            transaction_timeout: Duration::from_millis(timeout_ms),
            retry_backoff: Duration::ZERO,
            low_stock_threshold: 10,
        })
    }

    #[tokio::test]
    async fn test_conflict_is_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = policy(3, 1000)
            .run("op", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(conflict())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = policy(2, 1000)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            })
            .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_conflict_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = policy(5, 1000)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SalesError::InsufficientStock { items: vec![] })
            })
            .await;

        assert!(matches!(result, Err(SalesError::InsufficientStock { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let result: Result<()> = policy(3, 10)
            .run("op", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(SalesError::Timeout { operation: "op", .. })
        ));
    }
}
