// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Contiguous partition planning.
//!
//! # Division Formula
//!
//! ```text
//! division_len = ceil(count / divisions)
//! partition_k  = [k * division_len, min((k + 1) * division_len, count))
//! ```
//!
//! Partitions are generated by advancing a cursor by `division_len` until it
//! reaches `count`; the last partition is clipped. A partition's start index
//! doubles as its sort key when results are reassembled.

use std::num::NonZeroUsize;
use std::ops::Range;

/// Hardware parallelism reported by the OS, or `1` when it cannot be queried.
///
/// Queried on every call; nothing is cached in process-wide state.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Resolves a concurrency hint to a division count.
///
/// `None` means "use the hardware parallelism". The result is clamped to
/// `min(hint, available_parallelism())` and is never below 1.
pub fn resolve_divisions(hint: Option<usize>) -> usize {
    let hardware = available_parallelism();
    hint.unwrap_or(hardware).min(hardware).max(1)
}

/// A half-open index range `[start, end)` over the input sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
    /// First index covered (also the reassembly sort key).
    pub start: usize,
    /// One past the last index covered.
    pub end: usize,
}

impl Partition {
    /// Number of elements covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the partition covers no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The partition as a slice range.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The partitions computed for one invocation.
///
/// Partitions are contiguous, non-overlapping, in ascending order, and their
/// union is exactly `[0, count)`. An empty input yields no partitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    count: usize,
    division_len: usize,
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Splits `count` elements into at most `divisions` partitions.
    ///
    /// `divisions` of 0 is treated as 1.
    pub fn new(count: usize, divisions: usize) -> Self {
        if count == 0 {
            return Self {
                count,
                division_len: 0,
                partitions: Vec::new(),
            };
        }

        let division_len = count.div_ceil(divisions.max(1));
        let mut partitions = Vec::with_capacity(count.div_ceil(division_len));
        let mut current = 0;
        while current < count {
            let end = current.saturating_add(division_len).min(count);
            partitions.push(Partition {
                start: current,
                end,
            });
            current = end;
        }

        Self {
            count,
            division_len,
            partitions,
        }
    }

    /// Total number of elements covered by the plan.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Length of every partition except possibly the last.
    pub fn division_len(&self) -> usize {
        self.division_len
    }

    /// The partitions in ascending start order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether the plan has no partitions (empty input).
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
