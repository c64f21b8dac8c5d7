//! Fixed-interval retry for startup work

use std::future::Future;
use std::time::Duration;

/// Default attempts for schema initialization (about five minutes).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default wait between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Bounded retry with a constant delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay between a failure and the next attempt
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Why a retried operation did not succeed
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error stopped the loop early
    Aborted { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }
}

/// Run `op` until it succeeds, the policy is exhausted, or it returns an
/// error `is_retryable` rejects.
///
/// Logs at info before each attempt and at warn after each failure.
/// `op` receives the 1-based attempt number.
pub async fn retry_fixed<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    is_retryable: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        tracing::info!(attempt, max_attempts, "{}: starting attempt", label);

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if !is_retryable(&error) => {
                tracing::error!(attempt, error = %error, "{}: not retryable", label);
                return Err(RetryError::Aborted { attempt, error });
            }
            Err(error) => {
                tracing::warn!(attempt, max_attempts, error = %error, "{}: attempt failed", label);
                if attempt >= max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
            }
        }

        tokio::time::sleep(policy.interval).await;
        attempt += 1;
    }
}
