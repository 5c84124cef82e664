//! The [`JobQueue`] collaborator contract (§6.2): the narrow interface the
//! core consumes from whatever at-least-once background job system the
//! host application already runs.

use crate::envelope::JobEnvelope;
use async_http_core::events::ProcessorEvent;
use async_trait::async_trait;
use std::fmt;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("job queue push failed: {0}")]
    PushFailed(String),
}

/// A lifecycle signal the host job system emits; the processor's
/// integration shim subscribes to these to drive `start!`/`quiet!`/
/// `shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Startup,
    Quiet,
    Shutdown,
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleSignal::Startup => "startup",
            LifecycleSignal::Quiet => "quiet",
            LifecycleSignal::Shutdown => "shutdown",
        };
        write!(f, "{s}")
    }
}

/// Wraps a [`LifecycleSignal`] so it can flow through the shared
/// [`async_http_core::events`] listener plumbing.
#[derive(Debug)]
pub struct LifecycleEvent {
    pub signal: LifecycleSignal,
    timestamp: Instant,
}

impl LifecycleEvent {
    pub fn new(signal: LifecycleSignal) -> Self {
        Self {
            signal,
            timestamp: Instant::now(),
        }
    }
}

impl ProcessorEvent for LifecycleEvent {
    fn event_type(&self) -> &'static str {
        match self.signal {
            LifecycleSignal::Startup => "startup",
            LifecycleSignal::Quiet => "quiet",
            LifecycleSignal::Shutdown => "shutdown",
        }
    }

    fn timestamp(&self) -> Instant {
        self.timestamp
    }

    fn component_name(&self) -> &str {
        "jobqueue"
    }
}

/// Middleware invoked by the host queue around every job execution; used
/// by the integration shim to capture the "current job" context for the
/// duration of a job (see §9's replacement for thread-local state).
pub trait JobMiddleware: Send + Sync {
    fn before_execute(&self, envelope: &JobEnvelope);
    fn after_execute(&self, envelope: &JobEnvelope);
}

/// The narrow job-queue surface the core depends on: pushing new work,
/// registering middleware, and subscribing to lifecycle signals. A full
/// job-worker pool implementation is out of scope; this crate models only
/// the interface.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Pushes a new envelope onto the queue for eventual execution by a
    /// worker.
    async fn push(&self, envelope: JobEnvelope) -> Result<(), JobQueueError>;

    /// Registers middleware to run around every job this queue executes.
    fn register_middleware(&self, middleware: std::sync::Arc<dyn JobMiddleware>);

    /// Registers a callback invoked whenever the host emits a lifecycle
    /// signal. Boxed rather than generic so `JobQueue` stays object-safe.
    fn on_lifecycle(&self, f: Box<dyn Fn(&LifecycleEvent) + Send + Sync>);
}
