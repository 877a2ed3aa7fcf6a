//! Bounded condition polling. Replaces fixed settle sleeps: every wait has a
//! ceiling, and returns early as soon as the condition holds.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Interval multiplier applied after each failed attempt (1.0 = fixed).
    pub backoff: f64,
    pub max_interval: Duration,
}

impl PollPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            backoff: 1.0,
            max_interval: interval,
        }
    }

    /// Checks every `interval` until roughly `ceiling` has elapsed.
    pub fn within(ceiling: Duration, interval: Duration) -> Self {
        let step = interval.as_millis().max(1);
        let attempts = ceiling.as_millis().div_ceil(step) as u32;
        Self::fixed(interval, attempts + 1)
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor.max(1.0);
        self.max_interval = max_interval.max(self.interval);
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff).min(self.max_interval)
    }

    /// Total sleep time if the condition never holds.
    pub fn ceiling(&self) -> Duration {
        let mut total = Duration::ZERO;
        let mut step = self.interval;
        for _ in 1..self.max_attempts {
            total += step;
            step = self.next_interval(step);
        }
        total
    }
}

/// Evaluates `condition` up to `max_attempts` times, sleeping between checks.
/// Returns whether it ever held.
pub async fn poll_until<F, Fut>(policy: PollPolicy, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut step = policy.interval;
    for attempt in 1..=policy.max_attempts {
        if condition().await {
            return true;
        }
        if attempt < policy.max_attempts {
            sleep(step).await;
            step = policy.next_interval(step);
        }
    }
    false
}
