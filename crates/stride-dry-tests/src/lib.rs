// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for stride crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`sleeper`] - Recording sleeper for asserting backoff schedules
//! - [`flaky`] - Scripted operations that fail a set number of times
//! - [`rng`] - Deterministic xorshift RNG and shuffle
//! - [`logging`] - Test-writer tracing subscriber

pub mod flaky;
pub mod logging;
pub mod rng;
pub mod sleeper;

pub use flaky::{FlakyError, FlakyOperation};
pub use logging::init_tracing;
pub use rng::{shuffle, XorShift64};
pub use sleeper::RecordingSleeper;
