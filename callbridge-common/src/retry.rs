//! Bounded retry policy with injectable sleeper
//!
//! The CDR fetcher retries against an upstream record that may still be
//! mid-write when the webhook fires. The schedule is explicit (max attempts,
//! delay before the first attempt, delay before each retry) and sleeping goes
//! through the [`Sleeper`] trait so tests can run the schedule instantly.

use async_trait::async_trait;
use std::time::Duration;

/// Retry schedule for an eventually-consistent read.
///
/// `first_delay` runs before attempt 1 (the notification can race the
/// record's own write, so even the first read waits briefly);
/// `retry_delay` runs before every subsequent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub first_delay: Duration,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, first_delay: Duration, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            first_delay,
            retry_delay,
        }
    }

    /// Delay to apply before the given 1-based attempt number
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            self.first_delay
        } else {
            self.retry_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_delay: Duration::from_secs(3),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Sleep seam so the retry schedule is testable with a fake clock
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by tokio
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
