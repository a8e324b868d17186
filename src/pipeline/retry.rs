use crate::errors::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::error;

/// How failed chain operations are retried.
///
/// The default never gives up and sleeps a fixed 10 seconds between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Multiplier applied to the delay after each failure; 1.0 keeps it fixed.
    pub backoff_factor: f64,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            backoff_factor: 1.0,
            max_delay: Duration::from_secs(300),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some()
    }

    /// Sleep before attempt `attempt + 1` (attempts are 1-based).
    ///
    /// Never shorter than `delay`; a `max_delay` below it only stops the growth.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.backoff_factor <= 1.0 {
            return self.delay;
        }
        let ceiling = self.max_delay.max(self.delay);
        let exp = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.delay.as_secs_f64() * self.backoff_factor.powi(exp);
        if !secs.is_finite() || secs >= ceiling.as_secs_f64() {
            ceiling
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Log a failed attempt, then either sleep or give up.
    ///
    /// Returns `Err(RetriesExhausted)` once the attempt cap is reached.
    pub async fn pause_or_give_up(
        &self,
        operation: &'static str,
        attempt: u32,
        err: AppError,
    ) -> Result<()> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                error!(operation, attempt, error = %err, "[RETRY] giving up");
                return Err(AppError::RetriesExhausted {
                    operation,
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }
        }
        let delay = self.delay_for(attempt);
        error!(
            operation,
            attempt,
            error = %err,
            "[RETRY] {} failed, retrying in {:.1}s",
            operation,
            delay.as_secs_f64()
        );
        sleep(delay).await;
        Ok(())
    }

    /// Retry a read-only operation under this policy.
    pub async fn run<F, Fut, T>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    self.pause_or_give_up(operation, attempt, e).await?;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instant(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::ZERO,
            max_attempts,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn default_is_fixed_ten_seconds_unbounded() {
        let p = RetryPolicy::default();
        assert!(!p.is_bounded());
        assert_eq!(p.delay_for(1), Duration::from_secs(10));
        assert_eq!(p.delay_for(50), Duration::from_secs(10));
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let p = RetryPolicy {
            delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
            max_attempts: None,
        };
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(2), Duration::from_secs(4));
        assert_eq!(p.delay_for(3), Duration::from_secs(8));
        assert_eq!(p.delay_for(4), Duration::from_secs(10));
        assert_eq!(p.delay_for(1000), Duration::from_secs(10));
    }

    #[test]
    fn ceiling_below_base_delay_keeps_the_base() {
        let p = RetryPolicy {
            delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(3),
            max_attempts: None,
        };
        assert_eq!(p.delay_for(1), Duration::from_secs(10));
        assert_eq!(p.delay_for(5), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32> = instant(None)
            .run("test", || {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move {
                    if current < 2 {
                        Err(AppError::Other("flaky".into()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn bounded_policy_gives_up() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32> = instant(Some(4))
            .run("test", || {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err(AppError::Other("down".into())) }
            })
            .await;

        match res {
            Err(AppError::RetriesExhausted { attempts, operation, .. }) => {
                assert_eq!(attempts, 4);
                assert_eq!(operation, "test");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(counter.load(Ordering::Relaxed), 4);
    }
}
