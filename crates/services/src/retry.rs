use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Explicit retry policy for the token exchange: a fixed number of
/// attempts with linearly increasing delay between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Tagged result of driving an operation through a [`RetryPolicy`].
/// Failed attempts are kept in order for the caller's diagnostic trail.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success {
        value: T,
        attempts: u32,
        failures: Vec<E>,
    },
    Exhausted {
        failures: Vec<E>,
    },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay inserted after the given failed attempt (1-based):
    /// `base_delay × attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `op` until it succeeds or every attempt is spent. The
    /// closure receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut failures = Vec::new();

        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Success {
                        value,
                        attempts: attempt,
                        failures,
                    };
                }
                Err(err) => {
                    debug!(attempt, max = self.max_attempts, error = %err, "attempt failed");
                    failures.push(err);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.delay_after(attempt)).await;
                    }
                }
            }
        }

        RetryOutcome::Exhausted { failures }
    }
}
