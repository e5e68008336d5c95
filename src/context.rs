use std::future::{pending, Future};
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::{error::CancelReason, HttpError, Result};

/// Per-call cancellation and deadline.
///
/// A single context governs a whole call: every attempt and every backoff
/// wait. When no deadline is set, the client timeout applies from the moment
/// the call starts.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context with no token and no deadline of its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the call when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Fails the call with [`CancelReason::DeadlineExceeded`] at `deadline`.
    ///
    /// Overrides the client timeout.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Shorthand for a deadline `timeout` from now.
    ///
    /// A timeout too large to represent behaves as a deadline decades away.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| far_future(now));
        self.with_deadline(deadline)
    }

    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves the effective deadline for a call starting now.
    ///
    /// A zero `default_timeout` means no client deadline; a timeout past the
    /// range of [`Instant`] is treated the same way.
    pub(crate) fn scope(&self, default_timeout: Duration) -> CallScope {
        let deadline = match self.deadline {
            Some(deadline) => Some(deadline),
            None if default_timeout.is_zero() => None,
            None => Instant::now().checked_add(default_timeout),
        };
        CallScope {
            token: self.token.clone(),
            deadline,
        }
    }
}

// Same horizon tokio uses for its own far-future instants.
fn far_future(now: Instant) -> Instant {
    let thirty_years = Duration::from_secs(86_400 * 365 * 30);
    now.checked_add(thirty_years).unwrap_or(now)
}

/// A started call: the token plus a resolved deadline, if any.
#[derive(Clone, Debug)]
pub(crate) struct CallScope {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CallScope {
    /// Reports whether the call is already over.
    pub(crate) fn check(&self) -> Result<()> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(HttpError::Cancelled(CancelReason::Cancelled));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(HttpError::Cancelled(CancelReason::DeadlineExceeded));
        }
        Ok(())
    }

    /// Runs `fut` until it completes or the call is cancelled, whichever
    /// comes first. Cancellation wins ties.
    pub(crate) async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check()?;
        let cancelled = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(HttpError::Cancelled(CancelReason::Cancelled)),
            () = expired => {
                Err(HttpError::Cancelled(CancelReason::DeadlineExceeded))
            }
            output = fut => Ok(output),
        }
    }

    /// Suspends for `delay`, aborting early on cancellation.
    pub(crate) async fn sleep(&self, delay: Duration) -> Result<()> {
        self.run(tokio::time::sleep(delay)).await
    }
}
