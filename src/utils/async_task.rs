use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use crate::BackoffPolicy;
use crate::RefreshError;
use crate::Result;

/// Runs `task` until it succeeds, bounding each attempt by `policy.timeout_ms`.
///
/// At most `policy.max_retries` attempts are made. The delay between attempts
/// doubles from `base_delay_ms` and is capped at `max_delay_ms`. On exhaustion
/// the last failure is returned; a timed-out last attempt yields
/// `RefreshError::Timeout`.
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P>(
    task: F,
    policy: BackoffPolicy,
) -> Result<P>
where
    F: Fn() -> T,
    T: std::future::Future<Output = Result<P>>,
{
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let max_retries = policy.max_retries.max(1);
    let mut current_delay = Duration::from_millis(policy.base_delay_ms);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let last_error = match timeout(timeout_duration, task()).await {
            Ok(Ok(r)) => return Ok(r),
            Ok(Err(error)) => {
                warn!(attempt, ?error, "task failed");
                error
            }
            Err(_) => {
                warn!(attempt, ?timeout_duration, "task timed out");
                RefreshError::Timeout(timeout_duration).into()
            }
        };

        if attempt >= max_retries {
            warn!("Task failed after {} attempts", attempt);
            return Err(last_error);
        }

        debug!("Retrying in {:?}...", current_delay);
        sleep(current_delay).await;
        current_delay = (current_delay * 2).min(max_delay);
    }
}
