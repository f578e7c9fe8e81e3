//! Bounded retry with an injectable sleep.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};

/// Configuration: 3 total attempts, 5s apart.
pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Blocks between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::fixed(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Same delay before every retry. At least one attempt is always made.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait schedule between attempts.
    pub fn backoff(&self) -> Constant {
        Constant::new(self.delay)
    }

    /// Call `attempt` until it succeeds or the attempt budget is spent.
    ///
    /// `attempt` receives the 1-based attempt number. The last error is
    /// returned when every attempt fails.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, mut attempt: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut backoff = self.backoff();
        let mut n = 1;
        loop {
            match attempt(n) {
                Ok(value) => return Ok(value),
                Err(e) if n >= self.max_attempts => return Err(e),
                Err(e) => {
                    log::warn!("Attempt {n} of {} failed: {e}", self.max_attempts);
                    let Some(wait) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    log::info!("Waiting {} seconds before retry...", wait.as_secs());
                    sleeper.sleep(wait);
                    n += 1;
                }
            }
        }
    }
}
