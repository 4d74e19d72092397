// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One task per partition, joined back in start order.

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use stride_core::partition::merge::{merge_in_order, Outcome};
use stride_core::{CancelToken, PartitionPlan};
use tokio::task::JoinSet;
use tracing::trace;

/// Spawns `work` for every partition of `plan` and merges by start index.
///
/// The first failure, or a partition cancelling the shared token, aborts
/// every task still running. Aborted partitions contribute nothing to the
/// merge. A panicking task is re-raised on the awaiting task.
pub(crate) async fn run_tasks<T, R, E, W, Fut>(
    items: &Arc<[T]>,
    plan: &PartitionPlan,
    work: W,
) -> Result<Vec<Option<R>>, E>
where
    T: Send + Sync + 'static,
    W: Fn(Arc<[T]>, Range<usize>, Arc<CancelToken>) -> Fut + Send,
    Fut: Future<Output = Outcome<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    if plan.is_empty() {
        return Ok(Vec::new());
    }
    trace!(
        count = plan.count(),
        division_len = plan.division_len(),
        partitions = plan.len(),
        "spawning partition tasks"
    );

    let token = Arc::new(CancelToken::new());
    let mut set = JoinSet::new();
    for partition in plan.partitions() {
        let start = partition.start;
        let fut = work(Arc::clone(items), partition.range(), Arc::clone(&token));
        set.spawn(async move { (start, fut.await) });
    }

    let mut tagged = Vec::with_capacity(plan.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((start, outcome)) => {
                let stop = outcome.is_failed() || token.is_cancelled();
                tagged.push((start, outcome));
                if stop {
                    token.cancel();
                    set.abort_all();
                }
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            // aborted
            Err(_) => {}
        }
    }
    merge_in_order(tagged)
}
