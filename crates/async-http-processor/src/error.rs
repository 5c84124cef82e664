//! Errors the Processor raises synchronously to its caller. Per §7, these
//! are never delivered to a callback — only `enqueue`/`start`/`stop` ever
//! return them.

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("processor is not running (state is {state:?})")]
    NotRunning { state: crate::state::ProcessorState },

    #[error("processor is already running")]
    AlreadyRunning,

    #[error("in-flight capacity ({max_connections}) reached")]
    MaxCapacity { max_connections: usize },

    #[error("enqueue timed out waiting for capacity after {0:?}")]
    BackpressureTimeout(std::time::Duration),

    #[error("inflight registry error: {0}")]
    Registry(#[from] async_http_registry::BackendError),

    #[error("job queue error: {0}")]
    JobQueue(#[from] async_http_jobqueue::JobQueueError),

    #[error("internal reactor failure: {0}")]
    Internal(String),
}
