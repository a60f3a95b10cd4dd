//! Global token-bucket rate limiter for LLM calls (spec §5).
//!
//! Summarization fans out across many episodes concurrently, but the
//! upstream LLM vendor enforces a calls-per-minute quota shared by the whole
//! process. Callers block until a slot opens rather than failing; the
//! limiter only ever delays, never rejects.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Shared across every task that makes a rate-limited call.
pub struct RateLimiter {
    capacity: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `calls_per_minute` is the vendor's advertised quota; a
    /// `safety_fraction` (0.0-1.0) is withheld to absorb clock skew and
    /// concurrent callers racing the check.
    pub fn new(calls_per_minute: u32, safety_fraction: f64) -> Self {
        let effective = (calls_per_minute as f64 * (1.0 - safety_fraction)).floor() as usize;
        Self {
            capacity: effective.max(1),
            window: Duration::from_secs(60),
            calls: Mutex::new(VecDeque::with_capacity(effective.max(1))),
        }
    }

    pub fn from_defaults() -> Self {
        Self::new(
            crate::constants::rate_limit::DEFAULT_CALLS_PER_MINUTE,
            crate::constants::rate_limit::SAFETY_FRACTION,
        )
    }

    /// Block until a slot within the trailing window is available, then
    /// reserve it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while let Some(&front) = calls.front() {
                    if now.duration_since(front) >= self.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }
                if calls.len() < self.capacity {
                    calls.push_back(now);
                    None
                } else {
                    let oldest = *calls.front().unwrap();
                    Some(self.window - now.duration_since(oldest))
                }
            };
            match wait {
                None => return,
                Some(d) => sleep(d).await,
            }
        }
    }

    /// Number of calls currently counted within the trailing window.
    pub async fn in_flight(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn allows_calls_up_to_capacity_without_blocking() {
        let limiter = RateLimiter::new(10, 0.0);
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.in_flight().await, 10);
    }

    #[tokio::test]
    async fn safety_fraction_reduces_effective_capacity() {
        let limiter = RateLimiter::new(100, 0.1);
        assert_eq!(limiter.capacity, 90);
    }

    #[tokio::test]
    async fn concurrent_callers_all_eventually_acquire() {
        let limiter = Arc::new(RateLimiter::new(50, 0.0));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(limiter.in_flight().await, 20);
    }
}
