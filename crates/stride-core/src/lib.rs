// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! stride-core: order-preserving partitioned execution and bounded retry.
//!
//! Three pieces live here:
//!
//! - [`SharedValue`]: a mutex-guarded cell for accumulating state from
//!   concurrently running closures.
//! - [`PartitionedExecutor`] (and the [`ConcurrentSlice`] extension trait):
//!   splits a slice into contiguous partitions, runs a sequential body over
//!   each partition on its own scoped worker, and reassembles results in the
//!   original order.
//! - [`RetryExecutor`]: re-invokes a failable operation under a [`Backoff`]
//!   policy until it succeeds or its attempt budget runs out.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod shared;
mod stopwatch;

/// Partition planning and the blocking partitioned executor.
pub mod partition;
/// Retry executor, backoff policies and sleepers.
pub mod retry;

pub use config::{BackoffSpec, ConfigError, PartitionConfig, RetryConfig, StrideConfig};
pub use partition::{
    available_parallelism, resolve_divisions, CancelToken, ConcurrentSlice, Partition,
    PartitionPlan, PartitionedExecutor,
};
pub use retry::{
    AttemptFailure, Backoff, BackoffInput, RetryError, RetryExecutor, RetryState, Sleeper,
    ThreadSleeper,
};
pub use shared::SharedValue;
pub use stopwatch::{Stopwatch, Timed};
