//! Request pacing and bounded retries.
//!
//! Every request waits before it is sent so the service's abuse limits are
//! respected. Retries wait longer, growing by `backoff_factor` up to
//! `max_delay`.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::service::ServiceError;

/// Pacing and retry settings for one kind of request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub pause: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            max_tries: config.max_tries,
            pause: config.pause(),
            backoff_factor: config.backoff_factor,
            max_delay: config.max_delay(),
        }
    }

    /// Delay before a given attempt (1-based).
    ///
    /// The first attempt waits exactly `pause`; never less than `pause`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let pause = self.pause.as_secs_f64();
        let secs = pause * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64()).max(pause);
        Duration::from_secs_f64(capped)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// `max_tries` attempts have been made.
    ///
    /// `op` receives the attempt number so callers can vary the request
    /// (for instance, a fresh nonce). Exhaustion surfaces the last error.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        retryable: fn(&ServiceError) -> bool,
        mut op: F,
    ) -> Result<T, ChainError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            tokio::time::sleep(self.delay_for_attempt(attempt)).await;

            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !retryable(&err) {
                return Err(match err {
                    ServiceError::Rejected(msg) => ChainError::Rejected(msg),
                    transport => ChainError::RetriesExhausted {
                        operation,
                        attempts: attempt,
                        source: transport,
                    },
                });
            }

            if attempt >= self.max_tries {
                return Err(ChainError::RetriesExhausted {
                    operation,
                    attempts: attempt,
                    source: err,
                });
            }

            warn!(
                operation,
                attempt,
                max_tries = self.max_tries,
                error = %err,
                "request failed, retrying"
            );
        }
    }
}

/// Only transport failures are worth retrying.
pub fn transport_only(err: &ServiceError) -> bool {
    err.is_transport()
}

/// Transport failures and rejections are both retried (used when each
/// attempt picks a fresh code).
pub fn any_failure(_err: &ServiceError) -> bool {
    true
}
