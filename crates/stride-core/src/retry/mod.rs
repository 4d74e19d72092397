// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded retries with pluggable backoff.
//!
//! [`RetryExecutor`] owns the attempt loop and its observable state;
//! [`Backoff`] decides how long to wait after each failure; [`Sleeper`] is the
//! only place real time is spent.

mod error;
mod executor;
mod policy;
mod sleeper;

pub use error::RetryError;
pub use executor::{AttemptFailure, ErrorHook, Operation, RetryExecutor, RetryState};
pub use policy::{Backoff, BackoffInput, CustomBackoff, DEFAULT_GROWTH_FACTOR};
pub use sleeper::{Sleeper, ThreadSleeper};
