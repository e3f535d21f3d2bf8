use std::time::Duration;

use crate::foundation::{
    config::RetryConfig,
    error::{ReelError, ReelResult},
};

/// Bounded retry with linear backoff.
///
/// Attempt `n` (1-based) that fails transiently is followed by a sleep of
/// `backoff_base * n`. Non-transient errors return immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base: Duration::ZERO,
        }
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    /// Run `op(attempt)` until it succeeds, fails permanently or runs out
    /// of attempts. The last error is returned.
    pub fn run<T>(&self, mut op: impl FnMut(u32) -> ReelResult<T>) -> ReelResult<T> {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < max => {
                    let delay = self.backoff_for(attempt);
                    tracing::debug!(attempt, max, ?delay, error = %e, "retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(attempts = attempt, error = %e, "retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Wrap a validation rejection so the retry loop treats it like a decode failure.
pub fn invalid_frame_error(reason: Option<&str>) -> ReelError {
    ReelError::invalid_frame(reason.unwrap_or("rendered region rejected"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/retry.rs"]
mod tests;
