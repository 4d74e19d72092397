// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical reassembly of per-partition results.
//!
//! Workers finish in arbitrary order. Every result is tagged with its
//! partition's start index; merging sorts by that tag, so the output is the
//! same for every worker count and every completion order.

/// What one partition produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<R, E> {
    /// The partition ran to completion (or to its own short-circuit).
    Done(R),
    /// The body failed on some element of the partition.
    Failed(E),
    /// The partition observed cancellation and stopped early.
    Cancelled,
}

impl<R, E> Outcome<R, E> {
    /// Wraps a body result.
    pub fn from_result(result: Result<R, E>) -> Self {
        match result {
            Ok(r) => Self::Done(r),
            Err(e) => Self::Failed(e),
        }
    }

    /// Whether this outcome is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Sorts tagged outcomes into canonical (start index) order.
///
/// # Algorithm
///
/// 1. Sort by partition start index.
/// 2. The first failure in that order, if any, is the representative error;
///    every other failure is discarded.
/// 3. Otherwise return one slot per partition: `Some` for finished
///    partitions, `None` for cancelled ones.
///
/// # Errors
///
/// Returns the failure of the lowest-indexed failing partition.
pub fn merge_in_order<R, E>(mut tagged: Vec<(usize, Outcome<R, E>)>) -> Result<Vec<Option<R>>, E> {
    tagged.sort_unstable_by_key(|(start, _)| *start);

    let mut out = Vec::with_capacity(tagged.len());
    for (_, outcome) in tagged {
        match outcome {
            Outcome::Done(r) => out.push(Some(r)),
            Outcome::Cancelled => out.push(None),
            Outcome::Failed(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Concatenates ordered partition lists.
///
/// Cancelled slots only occur for list operations after a failure, which
/// [`merge_in_order`] has already reported; they contribute nothing here.
pub fn concat<R>(parts: Vec<Option<Vec<R>>>) -> Vec<R> {
    let total = parts.iter().flatten().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts.into_iter().flatten() {
        out.extend(part);
    }
    out
}

/// Logical AND over partition verdicts; a cancelled partition is a vacuous pass.
pub fn all(parts: &[Option<bool>]) -> bool {
    parts.iter().all(|p| p.unwrap_or(true))
}

/// Logical OR over partition verdicts; a cancelled partition is a vacuous miss.
pub fn any(parts: &[Option<bool>]) -> bool {
    parts.iter().any(|p| p.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;

    #[test]
    fn merge_sorts_by_start_regardless_of_arrival() {
        let tagged: Vec<(usize, Outcome<Vec<u8>, ()>)> = vec![
            (6, Outcome::Done(vec![6, 7])),
            (0, Outcome::Done(vec![0, 1, 2])),
            (3, Outcome::Done(vec![3, 4, 5])),
        ];
        let merged = merge_in_order(tagged).expect("no failures");
        assert_eq!(concat(merged), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn lowest_indexed_failure_wins() {
        let tagged: Vec<(usize, Outcome<(), &str>)> = vec![
            (8, Outcome::Failed("late")),
            (4, Outcome::Failed("early")),
            (0, Outcome::Done(())),
        ];
        assert_eq!(merge_in_order(tagged), Err("early"));
    }

    #[test]
    fn failure_beats_cancellation() {
        let tagged: Vec<(usize, Outcome<bool, &str>)> =
            vec![(0, Outcome::Cancelled), (5, Outcome::Failed("bad"))];
        assert_eq!(merge_in_order(tagged), Err("bad"));
    }

    #[test]
    fn cancelled_partitions_are_vacuous() {
        assert!(all(&[Some(true), None, Some(true)]));
        assert!(!all(&[None, Some(false)]));
        assert!(!any(&[None, Some(false)]));
        assert!(any(&[None, Some(true)]));
        assert!(all(&[]));
        assert!(!any(&[]));
    }
}
