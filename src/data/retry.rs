use super::{DataError, DataResult};
use std::time::Duration;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};

/// Bounded retry with exponential backoff for idempotent vendor reads.
/// Generative-text calls must never go through this: retrying them with
/// identical input is low-value given non-determinism.
pub async fn retry_with_backoff<F, Fut, T>(operation: F, max_attempts: usize) -> DataResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = DataResult<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(max_attempts);

    RetryIf::spawn(
        retry_strategy,
        || async {
            match operation().await {
                Ok(result) => Ok(result),
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!("Retryable vendor error: {}", e);
                    }
                    Err(e)
                }
            }
        },
        DataError::is_retryable,
    )
    .await
}
