//! Elapsed-time measurement for timed scopes.

use std::time::Instant;

/// Monotonic timer with millisecond resolution.
#[derive(Debug, Clone, Copy)]
pub struct OperationTimer {
    start: Instant,
}

impl OperationTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Finishes the timer and returns the elapsed whole milliseconds.
    #[must_use]
    pub fn finish(self) -> u128 {
        self.elapsed_ms()
    }
}

impl Default for OperationTimer {
    fn default() -> Self {
        Self::start()
    }
}
