// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocking retry executor.
//!
//! # State Machine
//!
//! ```text
//! Idle ──run──▶ Attempting ──ok──▶ Succeeded
//!                  │    ▲
//!                  │ err│ (attempts < max)
//!                  ▼    │
//!                Sleeping
//!                  │
//!                  └─ err (attempts >= max) ──▶ Exhausted
//! ```
//!
//! A missing operation or a zero attempt budget fails `run` while still in
//! `Idle`.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::config::{ConfigError, RetryConfig};

use super::error::RetryError;
use super::policy::{Backoff, BackoffInput};
use super::sleeper::{Sleeper, ThreadSleeper};

/// The wrapped zero-argument operation.
pub type Operation<'a, T, E> = Box<dyn FnMut() -> Result<T, E> + 'a>;

/// Called once per failed attempt.
pub type ErrorHook<'a, E> = Box<dyn FnMut(&AttemptFailure<'_, E>) + 'a>;

/// What an error hook sees about a failed attempt.
#[derive(Debug)]
pub struct AttemptFailure<'r, E> {
    /// Executor name.
    pub name: &'r str,
    /// The attempt that failed (1-based).
    pub attempt: u32,
    /// Attempt budget, `None` when unbounded.
    pub max_attempts: Option<u32>,
    /// The error this attempt raised.
    pub error: &'r E,
    /// Errors from earlier attempts, oldest first.
    pub history: &'r [E],
}

/// Lifecycle of a [`RetryExecutor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryState {
    /// Configured, not yet run.
    Idle,
    /// The operation is being invoked.
    Attempting,
    /// Waiting out a backoff delay.
    Sleeping,
    /// The operation returned a value (terminal).
    Succeeded,
    /// Every permitted attempt failed (terminal).
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttemptBudget {
    Unbounded,
    Limited(u32),
    Lifetime(Duration),
}

/// Re-invokes a failable operation under a backoff policy.
///
/// Built with chained `with_*` calls and consumed by a single
/// [`run`](Self::run). Every attempt blocks the calling thread; failures sleep
/// for the policy's delay (clamped to the backoff ceiling) before the next
/// attempt. Not meant to be shared between callers.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stride_core::{Backoff, RetryExecutor};
///
/// let mut calls = 0;
/// let mut executor = RetryExecutor::performing(|| {
///     calls += 1;
///     if calls < 3 { Err("not yet") } else { Ok(calls) }
/// })
/// .with_name("doc example")
/// .with_backoff(Backoff::fixed(Duration::from_millis(1)))
/// .with_attempts_limited_to(5);
///
/// assert_eq!(executor.run(), Ok(3));
/// assert_eq!(executor.attempts(), 3);
/// ```
pub struct RetryExecutor<'a, T, E> {
    name: String,
    state: RetryState,
    attempts: u32,
    budget: AttemptBudget,
    max_attempts: Option<u32>,
    ceiling: Option<Duration>,
    backoff: Backoff<'a, E>,
    errors: Vec<E>,
    operation: Option<Operation<'a, T, E>>,
    on_error: Option<ErrorHook<'a, E>>,
    sleeper: Box<dyn Sleeper + 'a>,
    rng: StdRng,
}

impl<'a, T, E> RetryExecutor<'a, T, E> {
    /// An executor with no operation. [`run`](Self::run) fails until one is
    /// supplied with [`with_operation`](Self::with_operation).
    pub fn new() -> Self {
        let mut rng = StdRng::from_entropy();
        let name = format!("{:016x}", rng.gen::<u64>());
        Self {
            name,
            state: RetryState::Idle,
            attempts: 0,
            budget: AttemptBudget::Unbounded,
            max_attempts: None,
            ceiling: None,
            backoff: Backoff::default(),
            errors: Vec::new(),
            operation: None,
            on_error: None,
            sleeper: Box::new(ThreadSleeper),
            rng,
        }
    }

    /// An executor wrapping `operation`.
    pub fn performing(operation: impl FnMut() -> Result<T, E> + 'a) -> Self {
        Self::new().with_operation(operation)
    }

    /// An executor configured from `config`, with no operation yet.
    ///
    /// A configured lifetime takes precedence over a configured attempt limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn from_config(config: &RetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut executor = Self::new().with_backoff(config.backoff.to_backoff());
        if let Some(name) = &config.name {
            executor = executor.with_name(name.clone());
        }
        if let Some(max) = config.max_attempts {
            executor = executor.with_attempts_limited_to(max);
        }
        if let Some(ms) = config.max_backoff_ms {
            executor = executor.with_backoff_time_limited_to(Duration::from_millis(ms));
        }
        if let Some(ms) = config.minimum_total_lifetime_ms {
            executor = executor.with_minimum_total_lifetime(Duration::from_millis(ms));
        }
        if let Some(seed) = config.seed {
            executor = executor.with_seed(seed);
        }
        Ok(executor)
    }

    /// Sets (or replaces) the operation.
    pub fn with_operation(mut self, operation: impl FnMut() -> Result<T, E> + 'a) -> Self {
        self.operation = Some(Box::new(operation));
        self
    }

    /// Names the executor in log output and error hooks.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the backoff policy (default: no delay).
    pub fn with_backoff(mut self, backoff: Backoff<'a, E>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Caps the number of attempts. Replaces any lifetime request.
    pub fn with_attempts_limited_to(mut self, max_attempts: u32) -> Self {
        self.budget = AttemptBudget::Limited(max_attempts);
        self
    }

    /// Caps every individual backoff delay.
    pub fn with_backoff_time_limited_to(mut self, ceiling: Duration) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Derives the attempt budget so cumulative backoff reaches at least
    /// `lifetime`. Replaces any attempt limit.
    ///
    /// The budget is computed when [`run`](Self::run) starts, from the policy
    /// and ceiling configured at that point.
    pub fn with_minimum_total_lifetime(mut self, lifetime: Duration) -> Self {
        self.budget = AttemptBudget::Lifetime(lifetime);
        self
    }

    /// Replaces the default (logging) error hook.
    pub fn handling_errors(mut self, hook: impl FnMut(&AttemptFailure<'_, E>) + 'a) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Replaces the thread sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Seeds the generator used by uniform policies.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Executor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Every error the operation has raised, oldest first.
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Error from the most recent failed attempt.
    pub fn last_error(&self) -> Option<&E> {
        self.errors.last()
    }

    /// Backoff ceiling, `None` when unbounded.
    pub fn ceiling(&self) -> Option<Duration> {
        self.ceiling
    }

    /// The attempt budget `run` would use, `None` when unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::ZeroAttemptBudget`] or
    /// [`RetryError::UnreachableLifetime`] for budgets `run` would reject.
    pub fn max_attempts(&self) -> Result<Option<u32>, RetryError<E>> {
        let max = match self.budget {
            AttemptBudget::Unbounded => None,
            AttemptBudget::Limited(max) => Some(max),
            AttemptBudget::Lifetime(lifetime) => Some(
                self.backoff
                    .attempts_for_lifetime(lifetime, self.ceiling)
                    .ok_or(RetryError::UnreachableLifetime { lifetime })?,
            ),
        };
        if max == Some(0) {
            return Err(RetryError::ZeroAttemptBudget);
        }
        Ok(max)
    }

    fn transition(&mut self, next: RetryState) {
        trace!(executor = %self.name, from = ?self.state, to = ?next, "retry state");
        self.state = next;
    }

    fn next_delay(&mut self, last_error: &E) -> Duration {
        let input = BackoffInput {
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            ceiling: self.ceiling,
            last_error: Some(last_error),
        };
        self.backoff.delay(input, &mut self.rng)
    }

    fn is_exhausted(&self) -> bool {
        self.max_attempts.is_some_and(|max| self.attempts >= max)
    }
}

impl<T, E: Clone + fmt::Debug> RetryExecutor<'_, T, E> {
    /// Runs the operation until it succeeds or the attempt budget is spent.
    ///
    /// The operation is consumed: a second call fails with
    /// [`RetryError::MissingOperation`].
    ///
    /// # Errors
    ///
    /// - [`RetryError::MissingOperation`], [`RetryError::ZeroAttemptBudget`],
    ///   [`RetryError::UnreachableLifetime`]: configuration problems; the
    ///   operation is never invoked.
    /// - [`RetryError::Exhausted`]: every attempt failed; carries a copy of
    ///   the last error, which also stays in [`errors`](Self::errors).
    pub fn run(&mut self) -> Result<T, RetryError<E>> {
        if self.operation.is_none() {
            return Err(RetryError::MissingOperation);
        }
        self.max_attempts = self.max_attempts()?;
        let Some(mut operation) = self.operation.take() else {
            return Err(RetryError::MissingOperation);
        };

        loop {
            self.transition(RetryState::Attempting);
            self.attempts = self.attempts.saturating_add(1);

            let error = match operation() {
                Ok(value) => {
                    self.transition(RetryState::Succeeded);
                    debug!(executor = %self.name, attempts = self.attempts, "operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            self.report_failure(&error);
            let delay = self.next_delay(&error);
            let exhausted = self.is_exhausted();
            let last = exhausted.then(|| error.clone());
            self.errors.push(error);

            if let Some(last) = last {
                self.transition(RetryState::Exhausted);
                return Err(RetryError::Exhausted {
                    attempts: self.attempts,
                    last,
                });
            }

            self.transition(RetryState::Sleeping);
            debug!(executor = %self.name, attempt = self.attempts, ?delay, "backing off");
            self.sleeper.sleep(delay);
        }
    }

    fn report_failure(&mut self, error: &E) {
        let failure = AttemptFailure {
            name: &self.name,
            attempt: self.attempts,
            max_attempts: self.max_attempts,
            error,
            history: &self.errors,
        };
        match self.on_error.as_mut() {
            Some(hook) => hook(&failure),
            None => warn!(
                executor = failure.name,
                attempt = failure.attempt,
                max_attempts = ?failure.max_attempts,
                error = ?failure.error,
                "attempt failed"
            ),
        }
    }
}

impl<T, E> Default for RetryExecutor<'_, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for RetryExecutor<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("budget", &self.budget)
            .field("ceiling", &self.ceiling)
            .field("backoff", &self.backoff)
            .field("has_operation", &self.operation.is_some())
            .finish_non_exhaustive()
    }
}
