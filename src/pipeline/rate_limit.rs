//! Request pacing.
//!
//! Items are processed one after another; after each recorded item the
//! harvester waits a random delay within the configured bounds, and after an
//! unexpected failure it waits a fixed penalty instead.

use std::time::Duration;

use rand::Rng;

use crate::models::RateLimitConfig;

/// Computes the delays applied between items.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_delay_ms: u64,
    max_delay_ms: u64,
    error_penalty: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_delay_ms: config.min_delay_ms,
            max_delay_ms: config.max_delay_ms.max(config.min_delay_ms),
            error_penalty: Duration::from_millis(config.error_penalty_ms),
        }
    }

    /// A limiter that never waits.
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            error_penalty_ms: 0,
        })
    }

    /// Uniformly random delay within `[min_delay_ms, max_delay_ms]`.
    pub fn inter_request_delay(&self) -> Duration {
        if self.max_delay_ms == self.min_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        let ms = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Fixed backpressure delay after an unexpected failure.
    pub fn error_penalty_delay(&self) -> Duration {
        self.error_penalty
    }
}

/// Sleep for `delay`, skipping the timer entirely for zero.
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
