// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wall-clock timing for blocking calls.

use std::time::{Duration, Instant};

/// A value paired with how long it took to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timed<T> {
    /// The produced value.
    pub value: T,
    /// Wall-clock time spent producing it.
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    /// Maps the value, keeping the measurement.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }
}

impl<T, E> Timed<Result<T, E>> {
    /// Moves the `Result` outward so `?` can be applied to a timed call.
    pub fn transpose(self) -> Result<Timed<T>, E> {
        let elapsed = self.elapsed;
        self.value.map(|value| Timed { value, elapsed })
    }
}

/// Monotonic stopwatch.
///
/// Running from construction; [`stop`](Self::stop) freezes the reading.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    stopped: Option<Instant>,
}

impl Stopwatch {
    /// Starts a new stopwatch.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
        }
    }

    /// Time since start, or until stop if stopped.
    pub fn elapsed(&self) -> Duration {
        self.stopped
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.started)
    }

    /// Freezes the reading and returns it. Later calls keep the first stop.
    pub fn stop(&mut self) -> Duration {
        self.stopped.get_or_insert_with(Instant::now);
        self.elapsed()
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        self.stopped.is_none()
    }

    /// Runs `f` and reports how long it took.
    pub fn time<T>(f: impl FnOnce() -> T) -> Timed<T> {
        let watch = Self::start();
        let value = f();
        Timed {
            value,
            elapsed: watch.elapsed(),
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}
