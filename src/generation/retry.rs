use std::future::Future;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{ArchitectError, Result};

/// Additional attempts after the first one when the provider reports quota exhaustion.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Wait between attempts. Longer than the provider's per-minute quota window.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(65);

/// When and how long to wait before trying a failed call again.
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub retryable: fn(&ArchitectError) -> bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            retryable: ArchitectError::is_quota,
        }
    }
}

impl BackoffPolicy {
    /// Same retry budget, no waiting. Meant for tests.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based). Fixed for now.
    pub fn delay_for(&self, _retry: u32) -> Duration {
        self.delay
    }

    pub fn should_retry(&self, error: &ArchitectError, retries_done: u32) -> bool {
        retries_done < self.max_retries && (self.retryable)(error)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. `on_retry` is told about every retry before the
/// wait starts. Both a running attempt and the wait are abandoned if
/// `cancel` fires.
pub async fn retry_with_backoff<T, F, Fut, R>(
    policy: &BackoffPolicy,
    cancel: &CancelToken,
    mut on_retry: R,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut(u32, Duration, &ArchitectError),
{
    let mut retries = 0;
    loop {
        cancel.check()?;
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ArchitectError::Cancelled),
            result = op() => result,
        };
        match attempt {
            Ok(value) => return Ok(value),
            Err(error) if policy.should_retry(&error, retries) => {
                retries += 1;
                let delay = policy.delay_for(retries);
                tracing::warn!(retry = retries, delay_secs = delay.as_secs(), %error, "retrying after backoff");
                on_retry(retries, delay, &error);
                cancel.sleep(delay).await?;
            }
            Err(error) => return Err(error),
        }
    }
}
