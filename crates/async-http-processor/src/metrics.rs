//! Atomic metrics (§2.5, §5): in-flight, total accepted/completed,
//! errors-by-kind, total duration. `total_duration` accumulates via a plain
//! `fetch_add` rather than a literal compare-and-swap loop — `AtomicU64`
//! addition is already atomic, so a CAS retry loop would only add
//! complexity for no stronger a guarantee.

use async_http_value::ErrorType;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const ERROR_KINDS: [ErrorType; 7] = [
    ErrorType::Timeout,
    ErrorType::Connection,
    ErrorType::Ssl,
    ErrorType::ResponseTooLarge,
    ErrorType::Redirect,
    ErrorType::Protocol,
    ErrorType::Unknown,
];

fn error_kind_index(kind: ErrorType) -> usize {
    ERROR_KINDS
        .iter()
        .position(|candidate| *candidate == kind)
        .expect("ERROR_KINDS enumerates every ErrorType variant")
}

/// A point-in-time read of every counter, returned by `metrics.snapshot()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub total_accepted: u64,
    pub total_completed: u64,
    pub errors_by_kind: Vec<(ErrorType, u64)>,
    pub total_duration_ms: u64,
}

/// The Processor's live counters. Cheap to clone (an `Arc` would be used by
/// callers that need to share one instance; this type itself holds no
/// shared state beyond its own atomics).
#[derive(Default)]
pub struct Metrics {
    total_accepted: AtomicU64,
    total_completed: AtomicU64,
    error_counts: [AtomicU64; 7],
    total_duration_ms: AtomicU64,
    in_flight: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.total_accepted.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, duration_ms: u64) {
        self.total_completed.fetch_add(1, Ordering::Relaxed);
        self.total_duration_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Records that an in-flight entry left without completing normally
    /// (cancelled-and-re-enqueued on shutdown), without touching the
    /// completion/duration counters.
    pub fn record_left_in_flight(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, kind: ErrorType) {
        self.error_counts[error_kind_index(kind)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight.load(Ordering::Relaxed),
            total_accepted: self.total_accepted.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            errors_by_kind: ERROR_KINDS
                .iter()
                .zip(self.error_counts.iter())
                .map(|(kind, count)| (*kind, count.load(Ordering::Relaxed)))
                .collect(),
            total_duration_ms: self.total_duration_ms.load(Ordering::Relaxed),
        }
    }
}
