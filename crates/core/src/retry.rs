use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded polling with a fixed delay between attempts.
///
/// Used where a backing service is eventually consistent, e.g. waiting for a
/// freshly created session to become resolvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Call `attempt` until it yields `Ok(Some(_))` or attempts run out.
    ///
    /// `Ok(None)` and `Err(_)` both count as "not yet". The attempt number
    /// passed to the closure starts at 1. No delay follows the final attempt.
    pub async fn run_until<T, E, F, Fut>(&self, mut attempt: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let max = self.max_attempts.max(1);
        for n in 1..=max {
            match attempt(n).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => tracing::debug!(attempt = n, max, "retry: not ready"),
                Err(err) => tracing::debug!(attempt = n, max, error = %err, "retry: attempt failed"),
            }
            if n < max && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        None
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}
