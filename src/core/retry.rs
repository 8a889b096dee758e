//! Bounded retry for store-level conflicts.

use crate::errors::Result;
use std::{future::Future, time::Duration};
use tracing::warn;

/// How many times a conflicting commit is attempted before the conflict is surfaced.
pub const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Pause before the first retry; doubled for each later one.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(10);

/// Delay before retrying after `attempt` failed attempts.
#[must_use]
pub fn backoff(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Runs `operation`, repeating it while it fails with a retryable error.
///
/// Each attempt must be a complete unit (its own database transaction), so a failed
/// attempt leaves nothing behind. Retries wait for [`backoff`] so the writer holding
/// the lock can commit first. Non-retryable errors are returned immediately.
pub async fn with_conflict_retry<T, F, Fut>(operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(e) if e.is_retryable() && attempt < MAX_COMMIT_ATTEMPTS => {
                let delay = backoff(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Commit conflicted, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
