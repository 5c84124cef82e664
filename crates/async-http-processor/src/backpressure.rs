//! Backpressure policy selectable via `backpressure_strategy` (§5): affects
//! `enqueue` only, never execution.

use std::time::Duration;

/// What `enqueue` does when local in-flight capacity (`max_connections`) is
/// already reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BackpressureStrategy {
    /// Fail immediately with `MaxCapacity`. Default.
    Raise,
    /// Wait up to `timeout` for capacity to free up before raising
    /// `BackpressureTimeout`.
    Block { timeout: Duration },
    /// Evict the longest-queued in-flight entry (cancelling it and
    /// re-enqueueing its job envelope) to make room for the new one.
    DropOldest,
}

impl Default for BackpressureStrategy {
    fn default() -> Self {
        BackpressureStrategy::Raise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_raise() {
        assert_eq!(BackpressureStrategy::default(), BackpressureStrategy::Raise);
    }
}
