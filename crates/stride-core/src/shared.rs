// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutex-guarded shared value for accumulating state across workers.

use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single value behind a mutex, observed and mutated only inside closures.
///
/// No reference to the inner value escapes a guarded closure, so the value is
/// never touched without the lock held. The lock is released when the closure
/// returns or unwinds.
///
/// # Reentrancy
///
/// Calling [`read`](Self::read) or [`mutate`](Self::mutate) on the same
/// instance from inside one of its own closures deadlocks. Closures must not
/// block or suspend while holding the lock.
///
/// # Example
///
/// ```
/// use stride_core::{ConcurrentSlice, SharedValue};
///
/// let total = SharedValue::new(0u64);
/// let items: Vec<u64> = (1..=100).collect();
/// items.concurrent_for_each(Some(4), |x| total.add_assign(*x));
/// assert_eq!(total.get(), 5050);
/// ```
pub struct SharedValue<T> {
    inner: Mutex<T>,
}

impl<T> SharedValue<T> {
    /// Wraps `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with shared access to the value and returns its result.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    /// Runs `f` with exclusive access to the value and returns its result.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    /// Overwrites the value.
    pub fn set(&self, value: T) {
        *self.lock() = value;
    }

    /// Swaps in `value` and returns the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.lock(), value)
    }

    /// Consumes the cell and returns the value.
    pub fn into_inner(self) -> T {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // A panic inside a guarded closure already propagates to its caller;
    // poisoning would only turn every later access into a second failure.
    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> SharedValue<T> {
    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.read(T::clone)
    }
}

impl<T: AddAssign> SharedValue<T> {
    /// Adds `rhs` to the value in place.
    pub fn add_assign(&self, rhs: T) {
        self.mutate(|v| *v += rhs);
    }
}

impl<T: SubAssign> SharedValue<T> {
    /// Subtracts `rhs` from the value in place.
    pub fn sub_assign(&self, rhs: T) {
        self.mutate(|v| *v -= rhs);
    }
}

impl<T: Default> Default for SharedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for SharedValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|v| f.debug_struct("SharedValue").field("value", v).finish())
    }
}

/// Compares two cells without ever holding both locks at once.
impl<T: PartialEq + Clone> PartialEq for SharedValue<T> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let lhs = self.get();
        other.read(|rhs| lhs == *rhs)
    }
}
