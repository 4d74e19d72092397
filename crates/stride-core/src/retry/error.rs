// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Terminal failures of a retry run.

use std::time::Duration;

use thiserror::Error;

/// Why [`RetryExecutor::run`](super::RetryExecutor::run) gave up.
///
/// The first three variants are configuration errors, raised before the
/// operation is ever invoked. Only [`Exhausted`](Self::Exhausted) carries an
/// operation error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// No operation was configured.
    #[error("no operation was provided to execute")]
    MissingOperation,
    /// The attempt budget is zero, so the operation could never run.
    #[error("attempt budget is zero; the operation would never run")]
    ZeroAttemptBudget,
    /// The backoff policy can never accumulate the requested lifetime.
    #[error("backoff policy can never accumulate a total lifetime of {lifetime:?}")]
    UnreachableLifetime {
        /// The requested minimum total lifetime.
        lifetime: Duration,
    },
    /// Every permitted attempt failed.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last: E,
    },
}

impl<E> RetryError<E> {
    /// Whether this is a configuration error (nothing was attempted).
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Exhausted { .. })
    }

    /// Attempts made before giving up, if any were.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// The final operation error, if the budget was exhausted.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}
