// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scoped-thread execution of a partition plan.
//!
//! Workers claim partitions from an atomic cursor until none remain, so a
//! slow partition never stalls a worker that could pick up the next one.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use super::cancel::CancelToken;
use super::merge::{merge_in_order, Outcome};
use super::plan::PartitionPlan;

/// Runs `work` over every partition of `items` and merges in start order.
///
/// `work` receives the partition's slice and the invocation's cancel token.
/// A partition that is claimed after cancellation is recorded as
/// [`Outcome::Cancelled`] without running. Any failure cancels the token.
///
/// Returns one slot per partition in ascending start order (`None` for a
/// cancelled partition). An empty input spawns nothing and returns an empty
/// vector.
///
/// # Panics
///
/// Re-raises the panic of any worker whose body panicked.
pub(crate) fn run_partitioned<'a, T, R, E, W>(
    items: &'a [T],
    divisions: usize,
    work: W,
) -> Result<Vec<Option<R>>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    W: Fn(&'a [T], &CancelToken) -> Outcome<R, E> + Sync,
{
    let plan = PartitionPlan::new(items.len(), divisions);
    if plan.is_empty() {
        return Ok(Vec::new());
    }

    let workers = plan.len().min(divisions.max(1));
    trace!(
        count = plan.count(),
        divisions,
        division_len = plan.division_len(),
        partitions = plan.len(),
        workers,
        "dispatching partitions"
    );

    let token = CancelToken::new();

    // A lone partition runs on the caller's thread.
    if workers == 1 {
        let tagged = claim_until_drained(items, &plan, &AtomicUsize::new(0), &token, &work);
        return merge_in_order(tagged);
    }

    let next = AtomicUsize::new(0);
    let tagged: Vec<(usize, Outcome<R, E>)> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let plan = &plan;
                let next = &next;
                let token = &token;
                let work = &work;
                s.spawn(move || claim_until_drained(items, plan, next, token, work))
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(tagged) => tagged,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    });

    merge_in_order(tagged)
}

fn claim_until_drained<'a, T, R, E, W>(
    items: &'a [T],
    plan: &PartitionPlan,
    next: &AtomicUsize,
    token: &CancelToken,
    work: &W,
) -> Vec<(usize, Outcome<R, E>)>
where
    W: Fn(&'a [T], &CancelToken) -> Outcome<R, E>,
{
    let mut tagged = Vec::new();
    loop {
        let ix = next.fetch_add(1, Ordering::Relaxed);
        let Some(partition) = plan.partitions().get(ix) else {
            break;
        };

        let outcome = if token.is_cancelled() {
            Outcome::Cancelled
        } else {
            work(&items[partition.range()], token)
        };
        if outcome.is_failed() {
            token.cancel();
        }
        tagged.push((partition.start, outcome));
    }
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn empty_input_never_calls_work() {
        let items: [u8; 0] = [];
        let merged = run_partitioned(&items, 4, |_, _| -> Outcome<(), Infallible> {
            unreachable!("no partitions to run")
        });
        assert!(matches!(merged, Ok(v) if v.is_empty()));
    }

    #[test]
    fn every_partition_reports_once_in_order() {
        let items: Vec<usize> = (0..97).collect();
        for divisions in 1..9 {
            let merged = run_partitioned(&items, divisions, |slice, _| -> Outcome<_, Infallible> {
                Outcome::Done(slice.first().copied())
            });
            let starts: Vec<_> = match merged {
                Ok(v) => v.into_iter().flatten().flatten().collect(),
                Err(never) => match never {},
            };
            let expected: Vec<_> = PartitionPlan::new(items.len(), divisions)
                .partitions()
                .iter()
                .map(|p| p.start)
                .collect();
            assert_eq!(starts, expected);
        }
    }

    #[test]
    fn failure_surfaces_as_the_merged_error() {
        let items: Vec<u32> = (0..64).collect();
        let merged = run_partitioned(&items, 4, |slice, _| {
            if slice.contains(&0) {
                Outcome::Failed("first partition")
            } else {
                Outcome::Done(())
            }
        });
        assert_eq!(merged, Err("first partition"));
    }

    #[test]
    #[should_panic(expected = "worker exploded")]
    fn worker_panics_propagate() {
        let items: Vec<u32> = (0..64).collect();
        let _ = run_partitioned(&items, 4, |slice, _| -> Outcome<(), Infallible> {
            assert!(!slice.contains(&40), "worker exploded");
            Outcome::Done(())
        });
    }
}
