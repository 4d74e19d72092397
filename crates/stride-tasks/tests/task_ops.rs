// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Async partitioned operations keep input order and abort outstanding
//! partitions once the answer (or an error) is known.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stride_core::SharedValue;
use stride_dry_tests::XorShift64;
use stride_tasks::TaskExecutor;

const WORKER_COUNTS: &[usize] = &[1, 2, 3, 4, 8];
const FOREVER: Duration = Duration::from_secs(3600);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn map_preserves_order_when_later_items_finish_first() {
    let items: Vec<u64> = (0..40).collect();
    for &workers in WORKER_COUNTS {
        let got = TaskExecutor::new(items.clone())
            .max_concurrency(workers)
            .map(|x| async move {
                // Earlier elements sleep longer.
                tokio::time::sleep(Duration::from_millis(40 - x)).await;
                x * 10
            })
            .await;
        assert_eq!(got, items.iter().map(|x| x * 10).collect::<Vec<_>>(), "workers={workers}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn generated_inputs_match_sequential_results() {
    let mut rng = XorShift64::new(0x5EED);
    let items = rng.vec(300, 100);
    let executor = TaskExecutor::new(items.clone()).max_concurrency(4);

    let evens = executor.filter(|x| async move { x % 2 == 0 }).await;
    let want: Vec<usize> = items.iter().copied().filter(|x| x % 2 == 0).collect();
    assert_eq!(evens, want);

    let halves = executor
        .filter_map(|x| async move { (x % 2 == 0).then_some(x / 2) })
        .await;
    assert_eq!(halves, want.iter().map(|x| x / 2).collect::<Vec<_>>());

    let kept = executor
        .nil_filter(|x| async move { (x > 50).then_some(()) })
        .await;
    assert_eq!(kept, items.iter().copied().filter(|x| *x > 50).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn for_each_runs_every_body_once() {
    let items: Vec<u64> = (1..=500).collect();
    let sum = Arc::new(SharedValue::new(0_u64));
    let calls = Arc::new(AtomicUsize::new(0));
    let (s, c) = (Arc::clone(&sum), Arc::clone(&calls));
    TaskExecutor::new(items)
        .max_concurrency(8)
        .for_each(move |x| {
            let (s, c) = (Arc::clone(&s), Arc::clone(&c));
            async move {
                s.add_assign(x);
                c.fetch_add(1, Ordering::Relaxed);
            }
        })
        .await;
    assert_eq!(sum.get(), 500 * 501 / 2);
    assert_eq!(calls.load(Ordering::Relaxed), 500);
}

#[tokio::test]
async fn empty_input_returns_identity_values() {
    let executor = TaskExecutor::new(Vec::<u8>::new());
    assert!(executor.map(|x| async move { x }).await.is_empty());
    assert!(executor.all_satisfy(|_| async { false }).await);
    assert!(!executor.contains(|_| async { true }).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contains_aborts_partitions_still_waiting() {
    let items: Vec<usize> = (0..64).collect();
    let found = tokio::time::timeout(
        Duration::from_secs(10),
        TaskExecutor::new(items).max_concurrency(4).contains(|x| async move {
            if x == 0 {
                return true;
            }
            tokio::time::sleep(FOREVER).await;
            false
        }),
    )
    .await
    .expect("contains should short-circuit");
    assert!(found);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn all_satisfy_aborts_on_first_counterexample() {
    let items: Vec<usize> = (0..64).collect();
    let all = tokio::time::timeout(
        Duration::from_secs(10),
        TaskExecutor::new(items).max_concurrency(4).all_satisfy(|x| async move {
            if x == 0 {
                return false;
            }
            tokio::time::sleep(FOREVER).await;
            true
        }),
    )
    .await
    .expect("all_satisfy should short-circuit");
    assert!(!all);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn try_map_failure_aborts_the_rest() {
    let items: Vec<usize> = (0..64).collect();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        TaskExecutor::new(items).max_concurrency(4).try_map(|x| async move {
            if x == 0 {
                return Err(format!("bad element {x}"));
            }
            tokio::time::sleep(FOREVER).await;
            Ok(x)
        }),
    )
    .await
    .expect("failure should abort outstanding tasks");
    assert_eq!(result, Err("bad element 0".to_owned()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[should_panic(expected = "body exploded")]
async fn body_panic_reaches_the_caller() {
    let _ = TaskExecutor::new(vec![1, 2, 3])
        .max_concurrency(1)
        .map(|x: i32| async move {
            assert!(x != 2, "body exploded");
            x
        })
        .await;
}
