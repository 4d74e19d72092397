// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backoff policies: attempt count → delay before the next attempt.
//!
//! Every computed delay is clamped to the executor's backoff ceiling.

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Growth factor used when none is given (matches the exponential default).
pub const DEFAULT_GROWTH_FACTOR: u32 = 2;

/// Inputs available to a backoff computation.
#[derive(Debug)]
pub struct BackoffInput<'e, E> {
    /// Attempts made so far (1-based once the first attempt has run).
    pub attempts: u32,
    /// Attempt budget, `None` when unbounded.
    pub max_attempts: Option<u32>,
    /// Backoff ceiling, `None` when unbounded.
    pub ceiling: Option<Duration>,
    /// Error from the attempt that just failed. `None` only while an attempt
    /// budget is being derived from a minimum lifetime.
    pub last_error: Option<&'e E>,
}

// Manual impls: deriving would require `E: Clone`.
impl<E> Clone for BackoffInput<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for BackoffInput<'_, E> {}

/// Caller-supplied delay function.
pub type CustomBackoff<'a, E> = Box<dyn Fn(BackoffInput<'_, E>) -> Duration + 'a>;

/// How long to wait between failed attempts.
pub enum Backoff<'a, E> {
    /// The same delay every time.
    Fixed(Duration),
    /// A delay drawn uniformly from `[low, high]`, re-sampled on every call.
    FixedUniform {
        /// Inclusive lower bound.
        low: Duration,
        /// Inclusive upper bound.
        high: Duration,
    },
    /// `initial × factor^(attempts − 1)`.
    Exponential {
        /// Delay after the first failure.
        initial: Duration,
        /// Integer growth factor.
        factor: u32,
    },
    /// `uniform(low, high) × factor^(attempts − 1)`; the base is re-sampled on
    /// every call, not memoized across attempts.
    ExponentialUniform {
        /// Inclusive lower bound of the base.
        low: Duration,
        /// Inclusive upper bound of the base.
        high: Duration,
        /// Integer growth factor.
        factor: u32,
    },
    /// Arbitrary function of the attempt state.
    Custom(CustomBackoff<'a, E>),
}

impl<'a, E> Backoff<'a, E> {
    /// [`Backoff::Fixed`].
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed(delay)
    }

    /// [`Backoff::FixedUniform`] with the bounds put in order.
    pub fn fixed_uniform(a: Duration, b: Duration) -> Self {
        let (low, high) = ordered(a, b);
        Self::FixedUniform { low, high }
    }

    /// [`Backoff::Exponential`].
    pub fn exponential(initial: Duration, factor: u32) -> Self {
        Self::Exponential { initial, factor }
    }

    /// [`Backoff::ExponentialUniform`] with the bounds put in order.
    pub fn exponential_uniform(a: Duration, b: Duration, factor: u32) -> Self {
        let (low, high) = ordered(a, b);
        Self::ExponentialUniform { low, high, factor }
    }

    /// [`Backoff::Custom`].
    pub fn custom(f: impl Fn(BackoffInput<'_, E>) -> Duration + 'a) -> Self {
        Self::Custom(Box::new(f))
    }

    /// Delay to sleep after a failure, clamped to `input.ceiling`.
    pub fn delay<R: Rng>(&self, input: BackoffInput<'_, E>, rng: &mut R) -> Duration {
        let cap = input.ceiling.unwrap_or(Duration::MAX);
        let raw = match self {
            Self::Fixed(d) => *d,
            Self::FixedUniform { low, high } => sample(rng, *low, *high),
            Self::Exponential { initial, factor } => grow(*initial, *factor, input.attempts, cap),
            Self::ExponentialUniform { low, high, factor } => {
                grow(sample(rng, *low, *high), *factor, input.attempts, cap)
            }
            Self::Custom(f) => f(input),
        };
        raw.min(cap)
    }

    /// Smallest delay the policy can produce, clamped like [`delay`](Self::delay).
    ///
    /// Uniform policies use their lower bound, so a budget derived from these
    /// delays still meets its lifetime in the worst case.
    pub fn floor_delay(&self, input: BackoffInput<'_, E>) -> Duration {
        let cap = input.ceiling.unwrap_or(Duration::MAX);
        let raw = match self {
            Self::Fixed(d) => *d,
            Self::FixedUniform { low, high } => ordered(*low, *high).0,
            Self::Exponential { initial, factor } => grow(*initial, *factor, input.attempts, cap),
            Self::ExponentialUniform { low, high, factor } => {
                grow(ordered(*low, *high).0, *factor, input.attempts, cap)
            }
            Self::Custom(f) => f(input),
        };
        raw.min(cap)
    }

    /// First attempt from which [`floor_delay`](Self::floor_delay) stops
    /// changing, `None` when the policy gives no such guarantee.
    ///
    /// A zero factor yields `initial` once and zero afterwards.
    fn settles_after(&self) -> Option<u32> {
        let exponential = |base: Duration, factor: u32| {
            if base.is_zero() || factor == 1 {
                Some(1)
            } else if factor == 0 {
                Some(2)
            } else {
                None
            }
        };
        match self {
            Self::Fixed(_) | Self::FixedUniform { .. } => Some(1),
            Self::Exponential { initial, factor } => exponential(*initial, *factor),
            Self::ExponentialUniform { low, high, factor } => {
                exponential(ordered(*low, *high).0, *factor)
            }
            Self::Custom(_) => None,
        }
    }

    /// Attempt budget whose cumulative backoff reaches at least `lifetime`.
    ///
    /// Sleeps happen between attempts, so `n` attempts accumulate the delays
    /// after attempts `1..n`. The policy is simulated forward (without
    /// sleeping) until the delay reaches `ceiling` or stops changing; from
    /// there whole steps of that delay are counted until `lifetime` is met.
    ///
    /// Returns `None` when the lifetime can never be reached (a zero steady
    /// delay, or a budget that overflows `u32`). The budget is at least 1.
    ///
    /// Custom policies are simulated step by step, so one that settles at zero
    /// runs until the attempt counter overflows.
    pub fn attempts_for_lifetime(&self, lifetime: Duration, ceiling: Option<Duration>) -> Option<u32> {
        let cap = ceiling.unwrap_or(Duration::MAX);
        let mut attempts: u32 = 0;
        let mut total = Duration::ZERO;
        let mut current = Duration::ZERO;

        let settled = self.settles_after();

        while total < lifetime && current < cap {
            attempts = attempts.checked_add(1)?;
            total = total.saturating_add(current);
            current = self.floor_delay(BackoffInput {
                attempts,
                max_attempts: None,
                ceiling,
                last_error: None,
            });
            if settled.is_some_and(|from| attempts >= from) {
                break;
            }
        }

        if total >= lifetime {
            return Some(attempts.max(1));
        }
        if current.is_zero() {
            return None;
        }
        let remaining = (lifetime - total).as_nanos();
        let steps = u32::try_from(remaining.div_ceil(current.as_nanos())).ok()?;
        attempts.checked_add(steps)
    }
}

impl<E> Default for Backoff<'_, E> {
    fn default() -> Self {
        Self::Fixed(Duration::ZERO)
    }
}

impl<E> fmt::Debug for Backoff<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Self::FixedUniform { low, high } => f
                .debug_struct("FixedUniform")
                .field("low", low)
                .field("high", high)
                .finish(),
            Self::Exponential { initial, factor } => f
                .debug_struct("Exponential")
                .field("initial", initial)
                .field("factor", factor)
                .finish(),
            Self::ExponentialUniform { low, high, factor } => f
                .debug_struct("ExponentialUniform")
                .field("low", low)
                .field("high", high)
                .field("factor", factor)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn ordered(a: Duration, b: Duration) -> (Duration, Duration) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sample<R: Rng>(rng: &mut R, a: Duration, b: Duration) -> Duration {
    let (low, high) = ordered(a, b);
    if low == high {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

// Stops multiplying once the cap is reached; later growth cannot matter.
fn grow(base: Duration, factor: u32, attempts: u32, cap: Duration) -> Duration {
    let mut delay = base;
    for _ in 1..attempts {
        if delay >= cap {
            break;
        }
        delay = delay.saturating_mul(factor);
    }
    delay
}
