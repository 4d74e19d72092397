// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sequential-equivalent operations over a partitioned slice.
//!
//! Every list-shaped operation returns exactly what its sequential
//! counterpart would, in the same order, for every concurrency degree.
//! Boolean reductions short-circuit across partitions through the
//! invocation's [`CancelToken`].

use std::convert::Infallible;

use crate::config::PartitionConfig;

use super::cancel::CancelToken;
use super::exec::run_partitioned;
use super::merge::{self, Outcome};
use super::plan::{resolve_divisions, PartitionPlan};

/// Runs per-element operations across contiguous partitions of a slice.
///
/// The concurrency degree defaults to the hardware parallelism and is
/// resolved when an operation runs, clamped to
/// `min(max_concurrency, available_parallelism())` and never below 1.
///
/// Shared mutable state touched by bodies must be synchronized by the caller,
/// for example through [`SharedValue`](crate::SharedValue).
///
/// # Example
///
/// ```
/// use stride_core::PartitionedExecutor;
///
/// let words = ["alpha", "beta", "gamma", "delta"];
/// let lens = PartitionedExecutor::new(&words).max_concurrency(2).map(|w| w.len());
/// assert_eq!(lens, vec![5, 4, 5, 5]);
/// ```
#[derive(Debug)]
pub struct PartitionedExecutor<'a, T> {
    items: &'a [T],
    max_concurrency: Option<usize>,
}

// Manual impls: deriving would require `T: Clone`.
impl<T> Clone for PartitionedExecutor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PartitionedExecutor<'_, T> {}

impl<'a, T: Sync> PartitionedExecutor<'a, T> {
    /// An executor over `items` at the default concurrency degree.
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            max_concurrency: None,
        }
    }

    /// An executor over `items` using the concurrency settings in `config`.
    pub fn with_config(items: &'a [T], config: &PartitionConfig) -> Self {
        Self {
            items,
            max_concurrency: config.max_concurrency.map(std::num::NonZeroUsize::get),
        }
    }

    /// Caps the number of partitions (and therefore concurrent workers).
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Overrides the cap with an optional hint; `None` restores the default.
    pub fn concurrency_hint(mut self, hint: Option<usize>) -> Self {
        self.max_concurrency = hint;
        self
    }

    /// The division count an operation would use right now.
    pub fn divisions(&self) -> usize {
        resolve_divisions(self.max_concurrency)
    }

    /// The partition plan an operation would use right now.
    pub fn plan(&self) -> PartitionPlan {
        PartitionPlan::new(self.items.len(), self.divisions())
    }

    // -------------------------------------------------------------------------
    // for-each
    // -------------------------------------------------------------------------

    /// Calls `body` once per element and returns after every worker is done.
    ///
    /// No ordering is guaranteed between elements of different partitions.
    pub fn for_each<F>(self, body: F)
    where
        F: Fn(&T) + Sync,
    {
        infallible(self.try_for_each(|item| {
            body(item);
            Ok(())
        }));
    }

    /// Fallible [`for_each`](Self::for_each).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any call to `body` failed. Other
    /// partitions stop at their next element once a failure is observed.
    pub fn try_for_each<E, F>(self, body: F) -> Result<(), E>
    where
        E: Send,
        F: Fn(&T) -> Result<(), E> + Sync,
    {
        run_partitioned(self.items, self.divisions(), |slice, token| {
            for item in slice {
                if token.is_cancelled() {
                    return Outcome::Cancelled;
                }
                if let Err(e) = body(item) {
                    return Outcome::Failed(e);
                }
            }
            Outcome::Done(())
        })
        .map(drop)
    }

    // -------------------------------------------------------------------------
    // map / compact-map
    // -------------------------------------------------------------------------

    /// Ordered `map`: identical to `items.iter().map(transform).collect()`.
    pub fn map<R, F>(self, transform: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        infallible(self.try_map(|item| Ok(transform(item))))
    }

    /// Fallible [`map`](Self::map).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any call to `transform` failed.
    pub fn try_map<R, E, F>(self, transform: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        self.collect_partitions(|slice, token| {
            let mut out = Vec::with_capacity(slice.len());
            for item in slice {
                if token.is_cancelled() {
                    return Outcome::Cancelled;
                }
                match transform(item) {
                    Ok(r) => out.push(r),
                    Err(e) => return Outcome::Failed(e),
                }
            }
            Outcome::Done(out)
        })
    }

    /// Ordered compact-map: identical to `items.iter().filter_map(transform)`.
    pub fn filter_map<R, F>(self, transform: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> Option<R> + Sync,
    {
        infallible(self.try_filter_map(|item| Ok(transform(item))))
    }

    /// Fallible [`filter_map`](Self::filter_map).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any call to `transform` failed.
    pub fn try_filter_map<R, E, F>(self, transform: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<Option<R>, E> + Sync,
    {
        self.collect_partitions(|slice, token| {
            let mut out = Vec::new();
            for item in slice {
                if token.is_cancelled() {
                    return Outcome::Cancelled;
                }
                match transform(item) {
                    Ok(Some(r)) => out.push(r),
                    Ok(None) => {}
                    Err(e) => return Outcome::Failed(e),
                }
            }
            Outcome::Done(out)
        })
    }

    // -------------------------------------------------------------------------
    // filter / nil-filter
    // -------------------------------------------------------------------------

    /// Ordered `filter`: the surviving elements, in their original order.
    pub fn filter<F>(self, predicate: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> bool + Sync,
    {
        infallible(self.try_filter(|item| Ok(predicate(item))))
    }

    /// Fallible [`filter`](Self::filter).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any call to `predicate` failed.
    pub fn try_filter<E, F>(self, predicate: F) -> Result<Vec<&'a T>, E>
    where
        E: Send,
        F: Fn(&T) -> Result<bool, E> + Sync,
    {
        self.collect_partitions(|slice, token| {
            let mut out = Vec::new();
            for item in slice {
                if token.is_cancelled() {
                    return Outcome::Cancelled;
                }
                match predicate(item) {
                    Ok(true) => out.push(item),
                    Ok(false) => {}
                    Err(e) => return Outcome::Failed(e),
                }
            }
            Outcome::Done(out)
        })
    }

    /// Keeps the elements for which `project` yields `Some`.
    ///
    /// The projected values are discarded; the original elements are returned
    /// in order.
    pub fn nil_filter<U, F>(self, project: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> Option<U> + Sync,
    {
        self.filter(|item| project(item).is_some())
    }

    /// Fallible [`nil_filter`](Self::nil_filter).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any call to `project` failed.
    pub fn try_nil_filter<U, E, F>(self, project: F) -> Result<Vec<&'a T>, E>
    where
        E: Send,
        F: Fn(&T) -> Result<Option<U>, E> + Sync,
    {
        self.try_filter(|item| project(item).map(|p| p.is_some()))
    }

    // -------------------------------------------------------------------------
    // all-satisfy / contains
    // -------------------------------------------------------------------------

    /// `true` iff every element satisfies `predicate` (`true` when empty).
    ///
    /// The first partition to find a counterexample cancels the others.
    pub fn all_satisfy<F>(self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        infallible(self.try_all_satisfy(|item| Ok(predicate(item))))
    }

    /// Fallible [`all_satisfy`](Self::all_satisfy).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any evaluated call to `predicate`
    /// failed.
    pub fn try_all_satisfy<E, F>(self, predicate: F) -> Result<bool, E>
    where
        E: Send,
        F: Fn(&T) -> Result<bool, E> + Sync,
    {
        let verdicts = run_partitioned(self.items, self.divisions(), |slice, token| {
            short_circuit(slice, token, false, &predicate)
        })?;
        Ok(merge::all(&verdicts))
    }

    /// `true` iff some element satisfies `predicate` (`false` when empty).
    ///
    /// The first partition to find a match cancels the others.
    pub fn contains<F>(self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        infallible(self.try_contains(|item| Ok(predicate(item))))
    }

    /// Fallible [`contains`](Self::contains).
    ///
    /// # Errors
    ///
    /// Returns one representative error if any evaluated call to `predicate`
    /// failed.
    pub fn try_contains<E, F>(self, predicate: F) -> Result<bool, E>
    where
        E: Send,
        F: Fn(&T) -> Result<bool, E> + Sync,
    {
        let verdicts = run_partitioned(self.items, self.divisions(), |slice, token| {
            short_circuit(slice, token, true, &predicate)
        })?;
        Ok(merge::any(&verdicts))
    }

    // -------------------------------------------------------------------------

    fn collect_partitions<R, E, W>(self, work: W) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        W: Fn(&'a [T], &CancelToken) -> Outcome<Vec<R>, E> + Sync,
    {
        run_partitioned(self.items, self.divisions(), work).map(merge::concat)
    }
}

/// Evaluates `predicate` over `slice` until it returns `decisive`.
///
/// Finding the decisive value cancels sibling partitions and reports it;
/// exhausting the slice reports the opposite.
fn short_circuit<T, E, F>(
    slice: &[T],
    token: &CancelToken,
    decisive: bool,
    predicate: &F,
) -> Outcome<bool, E>
where
    F: Fn(&T) -> Result<bool, E>,
{
    for item in slice {
        if token.is_cancelled() {
            return Outcome::Cancelled;
        }
        match predicate(item) {
            Ok(v) if v == decisive => {
                token.cancel();
                return Outcome::Done(decisive);
            }
            Ok(_) => {}
            Err(e) => return Outcome::Failed(e),
        }
    }
    Outcome::Done(!decisive)
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

/// Partitioned operations directly on slices (and, by deref, `Vec`s).
///
/// Each method takes an optional concurrency cap; `None` uses the hardware
/// parallelism. See [`PartitionedExecutor`] for the fallible `try_*` forms.
pub trait ConcurrentSlice<T: Sync> {
    /// A [`PartitionedExecutor`] over this slice.
    fn partitioned(&self) -> PartitionedExecutor<'_, T>;

    /// See [`PartitionedExecutor::for_each`].
    fn concurrent_for_each<F>(&self, max_concurrency: Option<usize>, body: F)
    where
        F: Fn(&T) + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .for_each(body);
    }

    /// See [`PartitionedExecutor::map`].
    fn concurrent_map<R, F>(&self, max_concurrency: Option<usize>, transform: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .map(transform)
    }

    /// See [`PartitionedExecutor::filter_map`].
    fn concurrent_compact_map<R, F>(&self, max_concurrency: Option<usize>, transform: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> Option<R> + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .filter_map(transform)
    }

    /// See [`PartitionedExecutor::filter`].
    fn concurrent_filter<F>(&self, max_concurrency: Option<usize>, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .filter(predicate)
    }

    /// See [`PartitionedExecutor::nil_filter`].
    fn concurrent_nil_filter<U, F>(&self, max_concurrency: Option<usize>, project: F) -> Vec<&T>
    where
        F: Fn(&T) -> Option<U> + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .nil_filter(project)
    }

    /// See [`PartitionedExecutor::all_satisfy`].
    fn concurrent_all_satisfy<F>(&self, max_concurrency: Option<usize>, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .all_satisfy(predicate)
    }

    /// See [`PartitionedExecutor::contains`].
    fn concurrent_contains<F>(&self, max_concurrency: Option<usize>, predicate: F) -> bool
    where
        F: Fn(&T) -> bool + Sync,
    {
        self.partitioned()
            .concurrency_hint(max_concurrency)
            .contains(predicate)
    }
}

impl<T: Sync> ConcurrentSlice<T> for [T] {
    fn partitioned(&self) -> PartitionedExecutor<'_, T> {
        PartitionedExecutor::new(self)
    }
}
