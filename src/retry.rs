//! Exponential backoff for calls that can fail transiently.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How long to wait between attempts and when to give up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub backoff_factor: u32,
    pub max_delay: Duration,
    /// `None` retries until success or a non-retryable error.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_factor
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy runs out of attempts. The last error is returned in the latter
/// two cases.
pub async fn retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    is_retryable: R,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let exhausted = policy.max_attempts.is_some_and(|max| attempt >= max);
                if !is_retryable(&e) || exhausted {
                    return Err(e);
                }
                let delay = policy.delay_for(attempt);
                warn!(error = %e, attempt, delay_secs = delay.as_secs_f64(), "Retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(5), Duration::from_secs(16));
        assert_eq!(policy.delay_for(6), Duration::from_secs(30));
        assert_eq!(policy.delay_for(60), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry(
            &fast_policy(),
            |e: &String| e == "transient",
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 4 {
                        Err("transient".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(4));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_stops_on_definitive_error() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry(
            &fast_policy(),
            |e: &String| e == "transient",
            || {
                calls.set(calls.get() + 1);
                async { Err("handle not found".to_string()) }
            },
        )
        .await;
        assert_eq!(result, Err("handle not found".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_respects_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..fast_policy()
        };
        let result: Result<(), String> = retry(
            &policy,
            |_: &String| true,
            || {
                calls.set(calls.get() + 1);
                async { Err("transient".to_string()) }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
