use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use crate::{context::CallScope, HttpError, Response, Result};

/// Result of a single attempt as seen by a [`RetryPredicate`].
///
/// An attempt either produced a response or failed before one was obtained,
/// never both.
#[derive(Clone, Copy, Debug)]
pub enum Outcome<'a> {
    /// A response was received, whatever its status.
    Response(&'a Response),
    /// No response: connect, DNS, reset or body read failure.
    Transport(&'a reqwest::Error),
}

impl Outcome<'_> {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response(response) => Some(response.status()),
            Self::Transport(_) => None,
        }
    }
}

/// Retries transport failures, any status `>= 500`, and `429`.
pub fn default_retryable(outcome: &Outcome<'_>) -> bool {
    match outcome {
        Outcome::Transport(_) => true,
        Outcome::Response(response) => {
            let status = response.status();
            status.as_u16() >= 500 || status == StatusCode::TOO_MANY_REQUESTS
        }
    }
}

/// Decides whether an attempt outcome should be retried.
#[derive(Clone)]
pub struct RetryPredicate(Arc<dyn Fn(&Outcome<'_>) -> bool + Send + Sync>);

impl RetryPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Outcome<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn is_retryable(&self, outcome: &Outcome<'_>) -> bool {
        (self.0)(outcome)
    }
}

impl Default for RetryPredicate {
    fn default() -> Self {
        Self::new(default_retryable)
    }
}

impl fmt::Debug for RetryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryPredicate(..)")
    }
}

/// Configures retry attempts and exponential backoff.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single wait.
    pub max_backoff: Duration,
    /// Multiplier applied per attempt. Must be finite and `>= 1.0`.
    pub backoff_factor: f64,
    /// Classifies attempt outcomes.
    pub retryable: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_factor: 2.0,
            retryable: RetryPredicate::default(),
        }
    }
}

impl RetryPolicy {
    /// Replaces the retry predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Outcome<'_>) -> bool + Send + Sync + 'static,
    {
        self.retryable = RetryPredicate::new(predicate);
        self
    }

    /// Total attempts allowed, including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Wait after the 0-based attempt `attempt`:
    /// `min(initial_backoff * backoff_factor^attempt, max_backoff)`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.backoff_factor.powi(exp);
        let cap = self.max_backoff.as_nanos() as f64;
        if !nanos.is_finite() || nanos >= cap {
            return self.max_backoff;
        }
        Duration::from_nanos(nanos as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(HttpError::InvalidConfig(format!(
                "backoff factor must be a finite number >= 1.0, got {}",
                self.backoff_factor
            )));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(HttpError::InvalidConfig(format!(
                "max backoff {:?} is shorter than initial backoff {:?}",
                self.max_backoff, self.initial_backoff
            )));
        }
        Ok(())
    }
}

/// Drives `attempt` until the outcome is terminal.
///
/// `attempt` receives the 1-based attempt number. Without a policy it runs
/// exactly once. Errors other than [`HttpError::Transport`] (serialization,
/// cancellation, invalid request) end the call immediately.
pub(crate) async fn execute<F, Fut>(
    policy: Option<&RetryPolicy>,
    scope: &CallScope,
    mut attempt: F,
) -> Result<Response>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Response>>,
{
    let Some(policy) = policy else {
        return attempt(1).await;
    };

    let max_attempts = policy.max_attempts();
    let mut index = 0usize;
    loop {
        let result = attempt(index + 1).await;
        let attempts = index + 1;

        let retryable = match &result {
            Ok(response) => policy.retryable.is_retryable(&Outcome::Response(response)),
            Err(HttpError::Transport(err)) => {
                policy.retryable.is_retryable(&Outcome::Transport(err))
            }
            Err(_) => return result,
        };
        if !retryable {
            return result;
        }

        if attempts >= max_attempts {
            return match result {
                Err(HttpError::Transport(source)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempts, error = %source, "retries exhausted");
                    Err(HttpError::RetryExhausted { attempts, source })
                }
                other => other,
            };
        }

        let delay = policy.backoff(index);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "retrying request after backoff"
        );
        scope.sleep(delay).await?;
        index += 1;
    }
}
