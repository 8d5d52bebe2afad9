//! Pacing for remote lookups.
//!
//! NCBI allows 3 requests per second without an API key and 10 with one.
//! Every lookup in the pipeline calls [`RateLimiter::pace`] first.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

pub const ANONYMOUS_INTERVAL: Duration = Duration::from_millis(500);
pub const API_KEY_INTERVAL: Duration = Duration::from_millis(100);

pub trait RateLimiter {
    /// Blocks until the next remote call is allowed to start.
    fn pace(&mut self);
}

impl<T: RateLimiter + ?Sized> RateLimiter for Box<T> {
    fn pace(&mut self) {
        (**self).pace();
    }
}

/// Keeps at least `interval` between the starts of successive calls.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    last: Option<Instant>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn for_credential(has_api_key: bool) -> Self {
        if has_api_key {
            Self::new(API_KEY_INTERVAL)
        } else {
            Self::new(ANONYMOUS_INTERVAL)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RateLimiter for FixedInterval {
    fn pace(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limit pause");
                thread::sleep(wait);
            }
        }
        self.last = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

impl RateLimiter for Unthrottled {
    fn pace(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_not_delayed() {
        let mut limiter = FixedInterval::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.pace();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn successive_calls_are_spaced() {
        let interval = Duration::from_millis(40);
        let mut limiter = FixedInterval::new(interval);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.pace();
        }
        assert!(start.elapsed() >= interval * 3);
    }

    #[test]
    fn credential_selects_interval() {
        assert_eq!(FixedInterval::for_credential(false).interval(), ANONYMOUS_INTERVAL);
        assert_eq!(FixedInterval::for_credential(true).interval(), API_KEY_INTERVAL);
    }
}
