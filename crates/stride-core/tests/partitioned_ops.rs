// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//! Partitioned operations agree with their sequential counterparts for every
//! concurrency degree and input length.

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use stride_core::{ConcurrentSlice, PartitionPlan, PartitionedExecutor, SharedValue};

mod common;
use common::{input, shuffle, XorShift64, SEEDS, WORKER_COUNTS};

#[test]
fn map_preserves_order_across_worker_counts() {
    for &seed in SEEDS {
        for len in [0, 1, 2, 5, 31, 257] {
            let items = input(seed, len);
            let expected: Vec<usize> = items.iter().map(|x| x * 3 + 1).collect();
            for &workers in WORKER_COUNTS {
                let got = PartitionedExecutor::new(&items)
                    .max_concurrency(workers)
                    .map(|x| x * 3 + 1);
                assert_eq!(got, expected, "seed={seed:#x} len={len} workers={workers}");
            }
        }
    }
}

#[test]
fn shuffled_input_maps_to_shuffled_output() {
    let mut items: Vec<u32> = (0..500).collect();
    shuffle(&mut XorShift64::new(9), &mut items);
    let doubled = items.concurrent_map(Some(8), |x| x * 2);
    assert!(doubled.iter().zip(&items).all(|(d, x)| *d == x * 2));
}

#[test]
fn for_each_visits_every_element_exactly_once() {
    let items: Vec<usize> = (0..1000).collect();
    for &workers in WORKER_COUNTS {
        let hits: Vec<AtomicUsize> = (0..items.len()).map(|_| AtomicUsize::new(0)).collect();
        items.concurrent_for_each(Some(workers), |&i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(
            hits.iter().all(|h| h.load(Ordering::Relaxed) == 1),
            "workers={workers}"
        );
    }
}

#[test]
fn shared_value_accumulates_without_lost_updates() {
    let items: Vec<u64> = (1..=10_000).collect();
    let sum = SharedValue::new(0_u64);
    items.concurrent_for_each(Some(8), |x| sum.add_assign(*x));
    assert_eq!(sum.get(), 10_000 * 10_001 / 2);
}

#[test]
fn filter_returns_original_elements_in_order() {
    let words = ["apple", "kiwi", "banana", "fig", "cherry", "plum"];
    let long: Vec<&&str> = words.concurrent_filter(Some(3), |w| w.len() > 4);
    assert_eq!(long, vec![&"apple", &"banana", &"cherry"]);
}

#[test]
fn compact_map_and_nil_filter_agree_on_kept_positions() {
    let raw = ["1", "x", "22", "", "333", "y"];
    let parsed: Vec<u32> = raw.concurrent_compact_map(Some(4), |s| s.parse().ok());
    assert_eq!(parsed, vec![1, 22, 333]);
    let kept = raw.concurrent_nil_filter(Some(4), |s| s.parse::<u32>().ok());
    assert_eq!(kept, vec![&"1", &"22", &"333"]);
}

#[test]
fn boolean_reductions_on_empty_input() {
    let empty: [u8; 0] = [];
    assert!(empty.concurrent_all_satisfy(None, |_| false));
    assert!(!empty.concurrent_contains(None, |_| true));
    assert!(empty.concurrent_map(None, |x| *x).is_empty());
}

#[test]
fn contains_finds_a_single_match_anywhere() {
    let items: Vec<usize> = (0..4096).collect();
    for &workers in WORKER_COUNTS {
        for needle in [0, 1, 2047, 4095] {
            assert!(items.concurrent_contains(Some(workers), |&x| x == needle));
        }
        assert!(!items.concurrent_contains(Some(workers), |&x| x == 9999));
    }
}

#[test]
fn all_satisfy_detects_a_single_counterexample() {
    let mut items = vec![2_u32; 3000];
    assert!(items.concurrent_all_satisfy(Some(6), |x| x % 2 == 0));
    items[1777] = 3;
    assert!(!items.concurrent_all_satisfy(Some(6), |x| x % 2 == 0));
}

// Element 0 decides the answer immediately; every other element is slow, so
// siblings that ignore cancellation would evaluate their whole partition.
fn slow_unless_first(calls: &AtomicUsize, x: usize) {
    calls.fetch_add(1, Ordering::Relaxed);
    if x != 0 {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}

#[test]
fn all_satisfy_stops_sibling_partitions_after_a_counterexample() {
    let items: Vec<usize> = (0..4000).collect();
    let calls = AtomicUsize::new(0);
    let all = items.concurrent_all_satisfy(None, |&x| {
        slow_unless_first(&calls, x);
        x != 0
    });
    assert!(!all);
    let evaluated = calls.load(Ordering::Relaxed);
    assert!(evaluated < items.len() / 4, "evaluated {evaluated} of {}", items.len());
}

#[test]
fn contains_stops_sibling_partitions_after_a_match() {
    let items: Vec<usize> = (0..4000).collect();
    let calls = AtomicUsize::new(0);
    let found = PartitionedExecutor::new(&items).contains(|&x| {
        slow_unless_first(&calls, x);
        x == 0
    });
    assert!(found);
    let evaluated = calls.load(Ordering::Relaxed);
    assert!(evaluated < items.len() / 4, "evaluated {evaluated} of {}", items.len());
}

#[test]
fn try_map_reports_the_earliest_failing_partition() {
    let items: Vec<usize> = (0..100).collect();
    // One partition runs sequentially and stops at its first failure.
    let err = PartitionedExecutor::new(&items)
        .max_concurrency(1)
        .try_map(|&x| if x % 10 == 5 { Err(x) } else { Ok(x) })
        .unwrap_err();
    assert_eq!(err, 5);

    let ok: Result<Vec<usize>, ()> = PartitionedExecutor::new(&items)
        .max_concurrency(4)
        .try_map(|&x| Ok(x + 1));
    assert_eq!(ok.unwrap(), (1..=100).collect::<Vec<_>>());
}

#[test]
fn try_contains_surfaces_predicate_errors() {
    let items = [1, 2, 3];
    let result: Result<bool, &str> = PartitionedExecutor::new(&items)
        .max_concurrency(1)
        .try_contains(|&x| if x == 2 { Err("boom") } else { Ok(false) });
    assert_eq!(result, Err("boom"));
}

#[test]
fn plan_matches_documented_partitioning() {
    let plan = PartitionPlan::new(10, 4);
    assert_eq!(plan.division_len(), 3);
    let bounds: Vec<(usize, usize)> = plan.partitions().iter().map(|p| (p.start, p.end)).collect();
    assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 9), (9, 10)]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn map_equals_sequential(items in prop::collection::vec(any::<i32>(), 0..400), workers in 1usize..24) {
        let got = items.concurrent_map(Some(workers), |x| i64::from(*x) * 2);
        let want: Vec<i64> = items.iter().map(|x| i64::from(*x) * 2).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn filter_is_an_order_preserving_subsequence(items in prop::collection::vec(0u16..100, 0..400), workers in 1usize..24) {
        let got: Vec<u16> = items.concurrent_filter(Some(workers), |x| x % 3 == 0).into_iter().copied().collect();
        let want: Vec<u16> = items.iter().copied().filter(|x| x % 3 == 0).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn compact_map_equals_sequential(items in prop::collection::vec(any::<u8>(), 0..400), workers in 1usize..24) {
        let project = |x: &u8| (x % 4 != 0).then(|| u32::from(*x) + 1);
        let got = items.concurrent_compact_map(Some(workers), project);
        let want: Vec<u32> = items.iter().filter_map(project).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn reductions_equal_sequential(items in prop::collection::vec(0u8..50, 0..300), needle in 0u8..60, workers in 1usize..24) {
        prop_assert_eq!(
            items.concurrent_contains(Some(workers), |x| *x == needle),
            items.iter().any(|x| *x == needle)
        );
        prop_assert_eq!(
            items.concurrent_all_satisfy(Some(workers), |x| *x != needle),
            items.iter().all(|x| *x != needle)
        );
    }

    #[test]
    fn plan_tiles_the_input(count in 0usize..10_000, divisions in 0usize..64) {
        let plan = PartitionPlan::new(count, divisions);
        let mut next = 0;
        for p in plan.partitions() {
            prop_assert_eq!(p.start, next);
            prop_assert!(!p.is_empty());
            next = p.end;
        }
        prop_assert_eq!(next, count);
        prop_assert!(plan.len() <= divisions.max(1));
    }
}
