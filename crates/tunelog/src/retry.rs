use crate::error::tracing_err;
use crate::StoreResult;
use chrono::prelude::*;
use retry_policies::policies::ExponentialBackoff;
use retry_policies::{RetryDecision, RetryPolicy};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub(crate) fn default_retry_policy() -> ExponentialBackoff {
    ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(100), Duration::from_secs(2))
        .build_with_max_retries(3)
}

/// Runs the storage operation, repeating it while it fails with a
/// [transient](crate::StoreError::is_transient) error and the policy allows it.
///
/// Only idempotent operations may go through here.
pub(crate) async fn retry_transient<T, Fut>(
    op: &'static str,
    policy: &ExponentialBackoff,
    f: impl Fn() -> Fut,
) -> StoreResult<T>
where
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(output) => {
                if attempt > 0 {
                    warn!(op, attempt, "Storage operation succeeded after a retry");
                }
                return Ok(output);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            if attempt > 0 {
                warn!(
                    op,
                    attempt, "Storage operation failed with a non-retryable error after a retry"
                );
            }
            return Err(err);
        }

        let execute_after = match policy.should_retry(attempt) {
            RetryDecision::Retry { execute_after } => execute_after,
            RetryDecision::DoNotRetry => {
                warn!(op, attempt, "Giving up retrying storage operation");
                return Err(err);
            }
        };

        let duration = execute_after
            .signed_duration_since(Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        warn!(
            op,
            attempt,
            err = tracing_err(&err),
            duration = format_args!("{duration:.2?}"),
            "Sleeping before the next attempt",
        );

        tokio::time::sleep(duration).await;

        attempt += 1;
    }
}
