// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted operations that fail a set number of times before succeeding.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Error raised by a [`FlakyOperation`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulated failure on call {call}")]
pub struct FlakyError {
    /// 1-based call number that failed.
    pub call: u32,
}

/// Operation that fails its first `failures` calls, then returns the call
/// number.
///
/// Clones share the call counter.
#[derive(Clone, Debug)]
pub struct FlakyOperation {
    failures: u32,
    calls: Arc<AtomicU32>,
}

impl FlakyOperation {
    /// Fails `failures` times, then succeeds.
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never succeeds.
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    /// Invoke once.
    pub fn call(&self) -> Result<u32, FlakyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(FlakyError { call })
        } else {
            Ok(call)
        }
    }

    /// A closure suitable for `RetryExecutor::performing`.
    pub fn operation(&self) -> impl FnMut() -> Result<u32, FlakyError> + Send + 'static {
        let this = self.clone();
        move || this.call()
    }

    /// Calls made so far across all clones.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fails_then_succeeds() {
        let op = FlakyOperation::failing(2);
        assert_eq!(op.call(), Err(FlakyError { call: 1 }));
        assert_eq!(op.call(), Err(FlakyError { call: 2 }));
        assert_eq!(op.call(), Ok(3));
        assert_eq!(op.calls(), 3);
    }

    #[test]
    fn operation_shares_the_counter() {
        let op = FlakyOperation::always_failing();
        let mut f = op.operation();
        assert!(f().is_err());
        assert!(f().is_err());
        assert_eq!(op.calls(), 2);
    }
}
