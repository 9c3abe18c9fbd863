//! Fixed-delay retry for blocking fetches.

use std::fmt::Display;
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Up to `max_attempts` tries with the same `delay` between each; no
/// backoff growth and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or attempts run out; returns the last error.
    /// `op` receives the 1-based attempt number.
    pub fn run<T, E, F>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) if attempt < max => {
                    warn!(%label, attempt, max, error = %e, "fetch failed, retrying");
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(max: u32) -> RetryPolicy {
        RetryPolicy::new(max, Duration::ZERO)
    }

    #[test]
    fn default_is_three_attempts_two_seconds() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.delay, Duration::from_secs(2));
    }

    #[test]
    fn succeeds_first_try() {
        let mut calls = 0;
        let out: Result<i32, String> = quick(3).run("t", |_| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(out, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_success() {
        let out: Result<u32, String> = quick(3).run("t", |attempt| {
            if attempt < 3 {
                Err(format!("attempt {} failed", attempt))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(out, Ok(3));
    }

    #[test]
    fn gives_up_with_last_error() {
        let mut calls = 0;
        let out: Result<(), String> = quick(3).run("t", |attempt| {
            calls += 1;
            Err(format!("boom {}", attempt))
        });
        assert_eq!(out, Err("boom 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn waits_fixed_delay_between_attempts() {
        let delay = Duration::from_millis(25);
        let mut stamps = Vec::new();
        let out: Result<u32, String> = RetryPolicy::new(3, delay).run("t", |attempt| {
            stamps.push(std::time::Instant::now());
            if attempt < 3 {
                Err("down".into())
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(out, Ok(3));
        assert_eq!(stamps.len(), 3);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
    }

    #[test]
    fn no_delay_after_final_failure() {
        let delay = Duration::from_millis(200);
        let started = std::time::Instant::now();
        let _: Result<(), String> = RetryPolicy::new(1, delay).run("t", |_| Err("down".into()));
        assert!(started.elapsed() < delay);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _: Result<(), String> = RetryPolicy::new(0, Duration::ZERO).run("t", |_| {
            calls += 1;
            Err("no".into())
        });
        assert_eq!(calls, 1);
    }
}
