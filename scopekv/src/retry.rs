//! Bounded exponential backoff with jitter.
//!
//! Attempt 0 runs immediately. Before every later attempt the loop sleeps for
//! the current wait, then multiplies the wait by `multiplier`, then adds a
//! uniformly random jitter in `[0, wait)` to it. Jitter therefore compounds
//! into later waits. `max_delay` is carried for callers but is not enforced
//! by the loop.

use std::future::{self, Future};
use std::sync::OnceLock;
use std::time::Duration;

use log::warn;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::errors::{RetryError, StoreError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Sleep before the second attempt.
    pub initial_delay: Duration,
    /// Advisory upper bound; not applied by [`Backoff::retry`].
    pub max_delay: Duration,
    /// Attempts before giving up. Zero retries forever.
    pub max_attempts: u32,
    pub multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
            multiplier: 2.0,
        }
    }
}

/// Steps of a retry loop. Terminal states end [`Backoff::retry_until`].
enum RetryState<E> {
    Attempting(u32),
    Waiting(u32),
    Succeeded,
    Aborted(E),
    Exhausted(u32),
    Cancelled,
}

impl Backoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32, multiplier: f64) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            multiplier,
        }
    }

    fn allows(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt < self.max_attempts
    }

    /// Successive sleeps taken between attempts, drawing jitter from `rng`.
    pub fn schedule<R: Rng>(&self, rng: R) -> Schedule<R> {
        Schedule {
            wait: self.initial_delay,
            multiplier: self.multiplier,
            rng,
        }
    }

    /// Runs `f` until it reports done, fails, or attempts run out.
    ///
    /// `f` receives the zero-based attempt number and returns `Ok(true)` when
    /// finished, `Ok(false)` to be retried, or `Err` to abort immediately.
    pub async fn retry<F, Fut, E>(&self, f: F) -> Result<(), RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.retry_until(f, future::pending()).await
    }

    /// Like [`Backoff::retry`], but a sleep between attempts is abandoned as soon
    /// as `cancel` completes. Cancellation never consumes an attempt.
    pub async fn retry_until<F, Fut, E, C>(&self, f: F, cancel: C) -> Result<(), RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        C: Future<Output = ()>,
    {
        let rng = StdRng::from_rng(&mut rand::rng());
        self.retry_with_rng(f, cancel, rng).await
    }

    pub async fn retry_with_rng<F, Fut, E, C, R>(&self, mut f: F, cancel: C, rng: R) -> Result<(), RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        C: Future<Output = ()>,
        R: Rng,
    {
        let mut schedule = self.schedule(rng);
        let mut cancel = std::pin::pin!(cancel);
        let mut state = RetryState::Attempting(0);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => match f(attempt).await {
                    Ok(true) => RetryState::Succeeded,
                    Ok(false) => RetryState::Waiting(attempt + 1),
                    Err(err) => RetryState::Aborted(err),
                },
                RetryState::Waiting(next) => {
                    if !self.allows(next) {
                        RetryState::Exhausted(next)
                    } else {
                        let wait = schedule.next().unwrap_or(self.initial_delay);
                        warn!("attempt {} did not complete, retrying in {:?}", next, wait);
                        tokio::select! {
                            _ = tokio::time::sleep(wait) => RetryState::Attempting(next),
                            _ = &mut cancel => RetryState::Cancelled,
                        }
                    }
                }
                RetryState::Succeeded => return Ok(()),
                RetryState::Aborted(err) => return Err(RetryError::Aborted(err)),
                RetryState::Exhausted(attempts) => return Err(RetryError::MaxRetryAttempts { attempts }),
                RetryState::Cancelled => return Err(RetryError::Cancelled),
            };
        }
    }

    /// Runs a store operation, retrying only backend availability failures.
    ///
    /// Validation, serialization, and precondition failures abort at once.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.run_until(op, future::pending()).await
    }

    /// [`Backoff::run`] with a cancellation signal, reported as [`StoreError::Cancelled`].
    pub async fn run_until<T, F, Fut, C>(&self, mut op: F, cancel: C) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
        C: Future<Output = ()>,
    {
        let output = OnceLock::new();
        let attempt_op = |attempt: u32| {
            let fut = op();
            let output = &output;
            async move {
                match fut.await {
                    Ok(value) => {
                        let _ = output.set(value);
                        Ok(true)
                    }
                    Err(err) if err.is_retryable() => {
                        warn!("attempt {attempt} failed: {err}");
                        Ok(false)
                    }
                    Err(err) => Err(err),
                }
            }
        };
        self.retry_until(attempt_op, cancel).await?;

        output.into_inner().ok_or(StoreError::Other {
            message: "retry loop finished without a result".into(),
        })
    }
}

/// Iterator over the sleeps of a retry loop.
pub struct Schedule<R> {
    wait: Duration,
    multiplier: f64,
    rng: R,
}

impl<R: Rng> Iterator for Schedule<R> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.wait;
        let grown = scale(self.wait, self.multiplier);
        let jitter = scale(grown, self.rng.random::<f64>());
        self.wait = grown.saturating_add(jitter);
        Some(current)
    }
}

fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor.max(0.0)).unwrap_or(Duration::MAX)
}
