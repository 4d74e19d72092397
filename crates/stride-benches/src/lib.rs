// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared workloads for the stride benchmarks.

use stride_dry_tests::XorShift64;

/// Deterministic input of `n` values.
pub fn workload(n: usize) -> Vec<u64> {
    let mut rng = XorShift64::new(0xBE4C_0001);
    (0..n).map(|_| rng.next_u64()).collect()
}

/// Sixty-four rounds of integer mixing, heavy enough that partitioning pays
/// for thread spawn at larger sizes.
pub fn mix(mut x: u64) -> u64 {
    for _ in 0..64 {
        x ^= x >> 33;
        x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
        x ^= x >> 33;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_is_deterministic() {
        assert_eq!(workload(16), workload(16));
        assert_ne!(mix(1), mix(2));
    }
}
