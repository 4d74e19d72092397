// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tiny deterministic RNG (xorshift64*) so fixtures don't need `rand`.

/// xorshift64* generator.
#[derive(Clone, Debug)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new PRNG with the given seed.
    ///
    /// A zero seed is replaced with 1 (xorshift would emit only zeros).
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    /// Next value in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// A value in `[0, upper)`; modulo bias is acceptable for fixtures.
    pub fn gen_range_usize(&mut self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        let upper = upper as u64;
        #[allow(clippy::cast_possible_truncation)]
        let value = (self.next_u64() % upper) as usize;
        value
    }

    /// `len` values in `[0, upper)`.
    pub fn vec(&mut self, len: usize, upper: usize) -> Vec<usize> {
        (0..len).map(|_| self.gen_range_usize(upper)).collect()
    }
}

/// Fisher–Yates shuffle (deterministic).
pub fn shuffle<T>(rng: &mut XorShift64, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range_usize(i + 1);
        items.swap(i, j);
    }
}
