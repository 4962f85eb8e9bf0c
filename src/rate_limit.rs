//! Fixed-window request limiting, keyed by caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use log::debug;

use crate::config::RateLimitConfig;

/// Above this many tracked keys, expired windows are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult
{   /// Request is allowed.
    Allowed
    {   remaining: u32
      , resets_in: Duration
    }
  , /// Rate limit exceeded.
    Exceeded
    {   retry_after: Duration
    }
}

impl RateLimitResult
{   pub fn is_allowed(&self) -> bool
    {   matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Remaining requests in the window (0 if exceeded).
    pub fn remaining(&self) -> u32
    {   match self
        {   RateLimitResult::Allowed { remaining, .. } => *remaining
          , RateLimitResult::Exceeded { .. } => 0
        }
    }
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState
{   count: u32
  , window_start: Instant
}

/// Shared counters; clones see the same state.
#[derive(Debug, Clone)]
pub struct RateLimiter
{   config: RateLimitConfig
  , state: Arc<Mutex<HashMap<String, WindowState>>>
}

impl RateLimiter
{   pub fn new(config: RateLimitConfig) -> Self
    {   debug!(
          "Rate limiter: {} requests per {} ms",
          config.max_requests,
          config.window_ms
        );
        RateLimiter
        {   config
          , state: Arc::new(Mutex::new(HashMap::new()))
        }
    }

    /// Check `key` and count the request if it is allowed.
    pub fn check_and_increment(&self, key: &str) -> RateLimitResult
    {   self.check_and_increment_at(key, Instant::now())
    }

    /// Same as `check_and_increment`, at a given instant. The check
    /// and the increment happen under one lock.
    pub fn check_and_increment_at(
      &self
    , key: &str
    , now: Instant
    ) -> RateLimitResult
    {   let window = self.config.window();
        let mut state = self.lock();

        if state.len() > PRUNE_THRESHOLD
        {   state.retain(|_, w| {
              now.saturating_duration_since(w.window_start) < window
            });
        }

        let window_state = state
          .entry(key.to_string())
          .or_insert_with(|| WindowState
          {   count: 0
            , window_start: now
          });

        if now.saturating_duration_since(window_state.window_start) >= window
        {   window_state.window_start = now;
            window_state.count = 0;
        }

        let elapsed = now.saturating_duration_since(window_state.window_start);
        let resets_in = window.saturating_sub(elapsed);

        if window_state.count >= self.config.max_requests
        {   return RateLimitResult::Exceeded
            {   retry_after: resets_in
            };
        }

        window_state.count += 1;
        RateLimitResult::Allowed
        {   remaining: self.config.max_requests - window_state.count
          , resets_in
        }
    }

    pub fn config(&self) -> &RateLimitConfig
    {   &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowState>>
    {   // Counters stay meaningful even if a holder panicked.
        self.state
          .lock()
          .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn limiter(max_requests: u32, window_ms: u64) -> RateLimiter
    {   RateLimiter::new(RateLimitConfig { window_ms, max_requests })
    }

    #[test]
    fn third_request_in_window_is_rejected()
    {   let limiter = limiter(2, 60_000);
        let start = Instant::now();

        let first = limiter.check_and_increment_at("ip", start);
        assert!(first.is_allowed());
        assert_eq!(first.remaining(), 1);
        assert!(limiter
          .check_and_increment_at("ip", start + Duration::from_secs(1))
          .is_allowed());

        let third = limiter
          .check_and_increment_at("ip", start + Duration::from_secs(2));
        assert_eq!(
          third,
          RateLimitResult::Exceeded
          {   retry_after: Duration::from_secs(58)
          }
        );
    }

    #[test]
    fn window_rolls_after_duration()
    {   let limiter = limiter(2, 60_000);
        let start = Instant::now();
        for _ in 0..3
        {   limiter.check_and_increment_at("ip", start);
        }
        assert!(!limiter.check_and_increment_at("ip", start).is_allowed());

        let later = start + Duration::from_millis(60_000);
        let result = limiter.check_and_increment_at("ip", later);
        assert!(result.is_allowed());
        assert_eq!(result.remaining(), 1);
    }

    #[test]
    fn rejected_requests_are_not_counted()
    {   let limiter = limiter(1, 1_000);
        let start = Instant::now();
        assert!(limiter.check_and_increment_at("ip", start).is_allowed());
        for _ in 0..5
        {   assert!(!limiter.check_and_increment_at("ip", start).is_allowed());
        }
        let state = limiter.lock();
        assert_eq!(state.get("ip").map(|w| w.count), Some(1));
    }

    #[test]
    fn keys_are_isolated()
    {   let limiter = limiter(1, 60_000);
        assert!(limiter.check_and_increment("a").is_allowed());
        assert!(!limiter.check_and_increment("a").is_allowed());
        assert!(limiter.check_and_increment("b").is_allowed());
    }

    #[test]
    fn concurrent_increments_are_not_lost()
    {   let limiter = limiter(1_000, 60_000);
        let handles: Vec<_> = (0..8)
          .map(|_| {
            let limiter = limiter.clone();
            std::thread::spawn(move || {
              (0..100)
                .filter(|_| limiter.check_and_increment("shared").is_allowed())
                .count()
            })
          })
          .collect();
        let allowed: usize = handles
          .into_iter()
          .map(|h| h.join().unwrap())
          .sum();
        assert_eq!(allowed, 800);
        assert_eq!(limiter.check_and_increment("shared").remaining(), 199);
    }
}
