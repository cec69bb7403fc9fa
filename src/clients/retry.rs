//! Retry policy applied by [`HttpSession`](crate::clients::HttpSession).
//!
//! A request is attempted once and then retried up to `max_retries` times.
//! Before retry `n` (the second attempt is retry 1) the session sleeps
//! `backoff_factor * 2^(n - 1)` seconds, capped at [`BACKOFF_MAX`]. With the
//! defaults this is 0.3s, 0.6s, then 1.2s.
//!
//! Connection failures are retried for every method. Timeouts and other
//! failures after the request may have reached the server are retried only
//! for idempotent methods, as are error statuses listed in the status
//! forcelist; there is no forcelist by default.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::clients::{HttpMethod, HttpResponse, RequestError};

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff factor, in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;

/// Upper bound of a single backoff sleep.
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Bounded retry with exponential backoff.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use exoscale::clients::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries(), 3);
/// assert_eq!(policy.backoff(1), Duration::from_millis(300));
/// assert_eq!(policy.backoff(2), Duration::from_millis(600));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
    status_forcelist: Option<HashSet<u16>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            status_forcelist: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with `max_retries` retries and the default backoff.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the backoff factor in seconds. Negative or non-finite values
    /// disable the backoff sleep.
    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = if backoff_factor.is_finite() {
            backoff_factor.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Sets the status codes that trigger a retry of idempotent requests.
    #[must_use]
    pub fn with_status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = Some(statuses.into_iter().collect());
        self
    }

    /// Returns the number of retries after the initial attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the backoff factor in seconds.
    #[must_use]
    pub const fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Returns the status forcelist, if configured.
    #[must_use]
    pub const fn status_forcelist(&self) -> Option<&HashSet<u16>> {
        self.status_forcelist.as_ref()
    }

    /// Returns the sleep preceding retry number `retry` (1-based).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        // Rounded to whole nanoseconds so 0.3 yields exactly 300ms.
        let nanos = (self.backoff_factor * 2f64.powi(exponent) * 1e9).round();
        if !nanos.is_finite() || nanos >= BACKOFF_MAX.as_nanos() as f64 {
            return BACKOFF_MAX;
        }
        Duration::from_nanos(nanos as u64)
    }

    /// Whether a response with status `code` to a `method` request is retried.
    #[must_use]
    pub fn should_retry_status(&self, method: HttpMethod, code: u16) -> bool {
        method.is_idempotent()
            && self
                .status_forcelist
                .as_ref()
                .is_some_and(|statuses| statuses.contains(&code))
    }

    /// Runs `attempt` until it succeeds, fails permanently, or retries are
    /// exhausted.
    ///
    /// `attempt` receives the 1-based attempt number. The outcome of the last
    /// attempt is returned as-is, including a forcelisted error response.
    ///
    /// # Errors
    ///
    /// Returns the [`RequestError`] of the last attempt when every attempt
    /// failed at the transport level, or the first one that is not
    /// retryable for `method`.
    pub async fn run<F, Fut>(
        &self,
        method: HttpMethod,
        mut attempt: F,
    ) -> Result<HttpResponse, RequestError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<HttpResponse, RequestError>>,
    {
        let mut retries: u32 = 0;
        loop {
            let outcome = attempt(retries + 1).await;

            let retryable = match &outcome {
                Ok(response) => self.should_retry_status(method, response.code),
                Err(error) => error.is_retryable(method),
            };
            if !retryable || retries >= self.max_retries {
                return outcome;
            }

            retries += 1;
            let delay = self.backoff(retries);
            match &outcome {
                Ok(response) => tracing::debug!(
                    retry = retries,
                    status = response.code,
                    delay_ms = delay.as_millis(),
                    "retrying request after forcelisted status"
                ),
                Err(error) => tracing::debug!(
                    retry = retries,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "retrying request after transport failure"
                ),
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
