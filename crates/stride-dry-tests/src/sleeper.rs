// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording sleeper for asserting backoff schedules without waiting.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stride_core::Sleeper;

/// [`Sleeper`] that records every requested delay and returns immediately.
///
/// Clones share the same log, so a test can hand one clone to the executor
/// and inspect the other.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stride_core::{Backoff, RetryExecutor};
/// use stride_dry_tests::{FlakyOperation, RecordingSleeper};
///
/// let sleeper = RecordingSleeper::new();
/// let flaky = FlakyOperation::failing(2);
/// let mut executor = RetryExecutor::performing(flaky.operation())
///     .with_backoff(Backoff::fixed(Duration::from_millis(300)))
///     .with_sleeper(sleeper.clone());
///
/// assert!(executor.run().is_ok());
/// assert_eq!(sleeper.total(), Duration::from_millis(600));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded delay, in call order.
    pub fn delays(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of sleeps requested.
    pub fn count(&self) -> usize {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Sum of every recorded delay.
    pub fn total(&self) -> Duration {
        self.slept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .sum()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let a = RecordingSleeper::new();
        let b = a.clone();
        a.sleep(Duration::from_millis(5));
        b.sleep(Duration::from_millis(7));
        assert_eq!(
            a.delays(),
            vec![Duration::from_millis(5), Duration::from_millis(7)]
        );
        assert_eq!(b.total(), Duration::from_millis(12));
        b.reset();
        assert_eq!(a.count(), 0);
    }
}
