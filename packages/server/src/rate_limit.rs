//! Per-connection rate limiting over a sliding one-minute window.
//!
//! Each session owns its own windows (one for chat, one for AI requests), so
//! the buckets are created with the connection and die with it. A violation
//! rejects the triggering message immediately with the remaining wait time;
//! nothing is queued or delayed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Length of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Chat rate-limit policy. Disabled by default; the AI window has its own
/// always-on limit configured alongside the AI provider.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub messages_per_minute: u32,
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            messages_per_minute: 0,
        }
    }

    pub fn per_minute(messages_per_minute: u32) -> Self {
        Self {
            enabled: true,
            messages_per_minute,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Rate limit exceeded. Please wait {wait_secs} seconds.")]
pub struct RateLimited {
    pub wait_secs: u64,
}

/// Sliding window counter over the timestamps of recent accepted messages.
pub struct SlidingWindow {
    enabled: bool,
    limit: u32,
    hits: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            limit: config.messages_per_minute,
            hits: VecDeque::new(),
        }
    }

    /// An always-enabled window, used for AI requests.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            enabled: true,
            limit,
            hits: VecDeque::new(),
        }
    }

    /// Check whether one more message is allowed right now, recording it if
    /// so. On violation returns the seconds until the window frees up.
    pub fn check(&mut self) -> Result<(), RateLimited> {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> Result<(), RateLimited> {
        if !self.enabled {
            return Ok(());
        }

        while let Some(front) = self.hits.front() {
            if now.duration_since(*front) > WINDOW {
                self.hits.pop_front();
            } else {
                break;
            }
        }

        if self.hits.len() >= self.limit as usize {
            if let Some(oldest) = self.hits.front() {
                let elapsed = now.duration_since(*oldest);
                let wait_secs = WINDOW.as_secs().saturating_sub(elapsed.as_secs()).max(1);
                return Err(RateLimited { wait_secs });
            }
        }

        self.hits.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_window_never_limits() {
        // given:
        let mut window = SlidingWindow::new(&RateLimitConfig::disabled());
        let now = Instant::now();

        // when / then:
        for _ in 0..1000 {
            assert_eq!(window.check_at(now), Ok(()));
        }
    }

    #[test]
    fn test_limit_of_two_rejects_the_third() {
        // given:
        let mut window = SlidingWindow::new(&RateLimitConfig::per_minute(2));
        let now = Instant::now();

        // when:
        let first = window.check_at(now);
        let second = window.check_at(now);
        let third = window.check_at(now);

        // then:
        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        assert_eq!(third, Err(RateLimited { wait_secs: 60 }));
    }

    #[test]
    fn test_window_frees_up_after_a_minute() {
        // given: a saturated window
        let mut window = SlidingWindow::with_limit(1);
        let start = Instant::now();
        assert_eq!(window.check_at(start), Ok(()));
        assert!(window.check_at(start).is_err());

        // when: the oldest hit ages out
        let later = start + WINDOW + Duration::from_secs(1);

        // then:
        assert_eq!(window.check_at(later), Ok(()));
    }

    #[test]
    fn test_wait_hint_shrinks_as_time_passes() {
        // given:
        let mut window = SlidingWindow::with_limit(1);
        let start = Instant::now();
        assert_eq!(window.check_at(start), Ok(()));

        // when: 45 seconds into the window
        let result = window.check_at(start + Duration::from_secs(45));

        // then:
        assert_eq!(result, Err(RateLimited { wait_secs: 15 }));
    }

    #[test]
    fn test_wait_hint_is_at_least_one_second() {
        // given:
        let mut window = SlidingWindow::with_limit(1);
        let start = Instant::now();
        assert_eq!(window.check_at(start), Ok(()));

        // when: just under the window boundary
        let result = window.check_at(start + Duration::from_millis(59_900));

        // then:
        assert_eq!(result, Err(RateLimited { wait_secs: 1 }));
    }
}
