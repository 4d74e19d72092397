// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Async partitioned operations.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use stride_core::partition::merge::{self, Outcome};
use stride_core::{resolve_divisions, PartitionConfig, PartitionPlan};

use crate::join::run_tasks;

/// Runs async per-element bodies across contiguous partitions of a shared
/// slice, one tokio task per partition.
///
/// Elements are handed to bodies by value (cloned out of the shared slice), so
/// bodies can move them into `async move` blocks. Within a partition, elements
/// are awaited one at a time; partitions run concurrently.
///
/// Every method must be awaited inside a tokio runtime.
///
/// # Example
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use stride_tasks::TaskExecutor;
///
/// let squares = TaskExecutor::new(vec![1_u64, 2, 3, 4])
///     .max_concurrency(2)
///     .map(|x| async move { x * x })
///     .await;
/// assert_eq!(squares, vec![1, 4, 9, 16]);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaskExecutor<T> {
    items: Arc<[T]>,
    max_concurrency: Option<usize>,
}

impl<T> TaskExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An executor over `items` at the default concurrency degree.
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self {
            items: items.into(),
            max_concurrency: None,
        }
    }

    /// An executor over `items` using the concurrency settings in `config`.
    pub fn with_config(items: impl Into<Arc<[T]>>, config: &PartitionConfig) -> Self {
        Self {
            items: items.into(),
            max_concurrency: config.max_concurrency.map(std::num::NonZeroUsize::get),
        }
    }

    /// Caps the number of partitions (and therefore concurrent tasks).
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// The shared input.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Partition count an operation would use right now.
    pub fn divisions(&self) -> usize {
        resolve_divisions(self.max_concurrency)
    }

    /// The plan an operation would run right now.
    pub fn plan(&self) -> PartitionPlan {
        PartitionPlan::new(self.items.len(), self.divisions())
    }

    // -------------------------------------------------------------------------
    // for-each
    // -------------------------------------------------------------------------

    /// Awaits `body` once per element.
    pub async fn for_each<F, Fut>(&self, body: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        infallible(self.try_for_each(move |item| ok(body(item))).await);
    }

    /// Fallible [`for_each`](Self::for_each).
    ///
    /// # Errors
    ///
    /// Returns one representative error; the remaining tasks are aborted.
    pub async fn try_for_each<E, F, Fut>(&self, body: F) -> Result<(), E>
    where
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.scan(move |item| {
            let fut = body(item);
            async move { fut.await.map(|()| None::<()>) }
        })
        .await
        .map(drop)
    }

    // -------------------------------------------------------------------------
    // map / compact-map
    // -------------------------------------------------------------------------

    /// Ordered async `map`.
    pub async fn map<R, F, Fut>(&self, transform: F) -> Vec<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        infallible(self.try_map(move |item| ok(transform(item))).await)
    }

    /// Fallible [`map`](Self::map).
    ///
    /// # Errors
    ///
    /// Returns one representative error; the remaining tasks are aborted.
    pub async fn try_map<R, E, F, Fut>(&self, transform: F) -> Result<Vec<R>, E>
    where
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        self.scan(move |item| {
            let fut = transform(item);
            async move { fut.await.map(Some) }
        })
        .await
    }

    /// Ordered async compact-map: keeps the `Some` results.
    pub async fn filter_map<R, F, Fut>(&self, transform: F) -> Vec<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<R>> + Send + 'static,
    {
        infallible(self.try_filter_map(move |item| ok(transform(item))).await)
    }

    /// Fallible [`filter_map`](Self::filter_map).
    ///
    /// # Errors
    ///
    /// Returns one representative error; the remaining tasks are aborted.
    pub async fn try_filter_map<R, E, F, Fut>(&self, transform: F) -> Result<Vec<R>, E>
    where
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>, E>> + Send + 'static,
    {
        self.scan(transform).await
    }

    // -------------------------------------------------------------------------
    // filter / nil-filter
    // -------------------------------------------------------------------------

    /// Elements for which `predicate` resolves to `true`, in input order.
    pub async fn filter<F, Fut>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        infallible(self.try_filter(move |item| ok(predicate(item))).await)
    }

    /// Fallible [`filter`](Self::filter).
    ///
    /// # Errors
    ///
    /// Returns one representative error; the remaining tasks are aborted.
    pub async fn try_filter<E, F, Fut>(&self, predicate: F) -> Result<Vec<T>, E>
    where
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
    {
        self.scan(move |item: T| {
            let fut = predicate(item.clone());
            async move { fut.await.map(|keep| keep.then_some(item)) }
        })
        .await
    }

    /// Elements whose projection resolves to `Some`, in input order.
    pub async fn nil_filter<U, F, Fut>(&self, project: F) -> Vec<T>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<U>> + Send + 'static,
    {
        infallible(self.try_nil_filter(move |item| ok(project(item))).await)
    }

    /// Fallible [`nil_filter`](Self::nil_filter).
    ///
    /// # Errors
    ///
    /// Returns one representative error; the remaining tasks are aborted.
    pub async fn try_nil_filter<U, E, F, Fut>(&self, project: F) -> Result<Vec<T>, E>
    where
        U: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<U>, E>> + Send + 'static,
    {
        self.scan(move |item: T| {
            let fut = project(item.clone());
            async move { fut.await.map(|projected| projected.is_some().then_some(item)) }
        })
        .await
    }

    // -------------------------------------------------------------------------
    // all-satisfy / contains
    // -------------------------------------------------------------------------

    /// `true` iff every element satisfies `predicate` (`true` when empty).
    pub async fn all_satisfy<F, Fut>(&self, predicate: F) -> bool
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        infallible(self.try_all_satisfy(move |item| ok(predicate(item))).await)
    }

    /// Fallible [`all_satisfy`](Self::all_satisfy).
    ///
    /// # Errors
    ///
    /// Returns one representative error from the evaluated predicates.
    pub async fn try_all_satisfy<E, F, Fut>(&self, predicate: F) -> Result<bool, E>
    where
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
    {
        let verdicts = self.short_circuit(false, predicate).await?;
        Ok(merge::all(&verdicts))
    }

    /// `true` iff some element satisfies `predicate` (`false` when empty).
    pub async fn contains<F, Fut>(&self, predicate: F) -> bool
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        infallible(self.try_contains(move |item| ok(predicate(item))).await)
    }

    /// Fallible [`contains`](Self::contains).
    ///
    /// # Errors
    ///
    /// Returns one representative error from the evaluated predicates.
    pub async fn try_contains<E, F, Fut>(&self, predicate: F) -> Result<bool, E>
    where
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
    {
        let verdicts = self.short_circuit(true, predicate).await?;
        Ok(merge::any(&verdicts))
    }

    // -------------------------------------------------------------------------

    /// Awaits `step` per element, keeping `Some` outputs in input order.
    async fn scan<R, E, S, SFut>(&self, step: S) -> Result<Vec<R>, E>
    where
        R: Send + 'static,
        E: Send + 'static,
        S: Fn(T) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = Result<Option<R>, E>> + Send + 'static,
    {
        let step = Arc::new(step);
        let parts = run_tasks(&self.items, &self.plan(), move |items, range, token| {
            let step = Arc::clone(&step);
            async move {
                let mut kept = Vec::new();
                for index in range {
                    if token.is_cancelled() {
                        return Outcome::Cancelled;
                    }
                    let item = items[index].clone();
                    match step(item).await {
                        Ok(Some(value)) => kept.push(value),
                        Ok(None) => {}
                        Err(e) => return Outcome::Failed(e),
                    }
                }
                Outcome::Done(kept)
            }
        })
        .await?;
        Ok(merge::concat(parts))
    }

    /// Awaits `predicate` per element until it resolves to `decisive`, which
    /// cancels every other partition.
    async fn short_circuit<E, F, Fut>(
        &self,
        decisive: bool,
        predicate: F,
    ) -> Result<Vec<Option<bool>>, E>
    where
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
    {
        let predicate = Arc::new(predicate);
        run_tasks(&self.items, &self.plan(), move |items, range, token| {
            let predicate = Arc::clone(&predicate);
            async move {
                for index in range {
                    if token.is_cancelled() {
                        return Outcome::Cancelled;
                    }
                    let item = items[index].clone();
                    match predicate(item).await {
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
        })
        .await
    }
}

impl<T> From<Vec<T>> for TaskExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

async fn ok<R: Send>(fut: impl Future<Output = R> + Send) -> Result<R, Infallible> {
    Ok(fut.await)
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(v) => v,
        Err(never) => match never {},
    }
}
