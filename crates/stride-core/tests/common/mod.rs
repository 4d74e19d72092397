// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

pub use stride_dry_tests::{shuffle, XorShift64};

/// Concurrency degrees every ordering test runs under.
pub const WORKER_COUNTS: &[usize] = &[1, 2, 3, 4, 7, 8, 16, 32];

/// Seeds for generated inputs.
pub const SEEDS: &[u64] = &[0x1, 0xDEAD_BEEF, 0x5EED_5EED, 42];

/// A generated input of `len` values in `[0, 1000)`.
pub fn input(seed: u64, len: usize) -> Vec<usize> {
    XorShift64::new(seed).vec(len, 1000)
}
