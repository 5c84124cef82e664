//! [`ContextMiddleware`]: the job-system integration shim that makes the
//! current job's [`JobContext`](crate::context::JobContext) ambient for
//! `request`/`get`/`post`/... calls made from inside a job, registered with
//! the host's `JobQueue` via [`async_http_jobqueue::JobQueue::register_middleware`].

use crate::context::{self, JobContext};
use async_http_jobqueue::{JobEnvelope, JobMiddleware, LifecycleEvent, LifecycleSignal};
use async_http_processor::Processor;
use std::sync::Arc;
use std::time::Duration;

/// Reads `job_class`/`retry_count` off the envelope and makes a
/// [`JobContext`] ambient for the duration of `before_execute` ..
/// `after_execute`; cleared afterwards so a worker thread reused for an
/// unrelated job never observes a stale context.
pub struct ContextMiddleware;

impl ContextMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContextMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl JobMiddleware for ContextMiddleware {
    fn before_execute(&self, envelope: &JobEnvelope) {
        let context = JobContext::new(envelope.class.clone()).with_attempt(envelope.retry_count.unwrap_or(0));
        context::set_current(Some(context));
    }

    fn after_execute(&self, _envelope: &JobEnvelope) {
        context::set_current(None);
    }
}

/// Wires a [`LifecycleSignal`] subscription on `job_queue` to the
/// corresponding `Processor` transition (§9 design note: the host
/// application's startup/quiet/shutdown hooks drive the processor's
/// lifecycle directly). `Startup`/`Quiet` call straight through; `Shutdown`
/// spawns a task on the current tokio runtime (if any is running) to await
/// `Processor::stop(shutdown_timeout)`, since shutdown must wait for
/// in-flight work but the signal itself is delivered synchronously.
pub fn install_lifecycle_hooks(
    job_queue: &dyn async_http_jobqueue::JobQueue,
    processor: Arc<Processor>,
    shutdown_timeout: Duration,
) {
    job_queue.on_lifecycle(Box::new(move |event: &LifecycleEvent| match event.signal {
        LifecycleSignal::Startup => {
            let _ = processor.start();
        }
        LifecycleSignal::Quiet => {
            let _ = processor.quiet();
        }
        LifecycleSignal::Shutdown => {
            let processor = processor.clone();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = processor.stop(shutdown_timeout).await;
                });
            }
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_execute_makes_the_envelope_class_the_current_job_context() {
        let middleware = ContextMiddleware::new();
        let envelope = JobEnvelope::new("SendWebhook", vec![]).with_retry_count(3);
        middleware.before_execute(&envelope);
        let ctx = context::current().unwrap();
        assert_eq!(ctx.job_class, "SendWebhook");
        assert_eq!(ctx.attempt, 3);
        middleware.after_execute(&envelope);
        assert!(context::current().is_none());
    }

    #[tokio::test]
    async fn startup_signal_starts_the_processor() {
        use async_http_client::ExecutorConfig;
        use async_http_jobqueue::MemoryJobQueue;
        use async_http_payload::{MemoryPayloadStore, PayloadStoreRegistry};
        use async_http_processor::ProcessorConfig;
        use async_http_registry::{InflightRegistry, MemoryInflightBackend, RegistryConfig};

        let registry = InflightRegistry::new(
            Arc::new(MemoryInflightBackend::new()),
            RegistryConfig::default(),
            "test-owner",
        );
        let mut stores = PayloadStoreRegistry::new();
        stores.register(Arc::new(MemoryPayloadStore::new("default")), true).unwrap();
        let config = ProcessorConfig::builder()
            .executor_config(ExecutorConfig::builder().build().unwrap())
            .test_mode(true)
            .build()
            .unwrap();
        let job_queue = MemoryJobQueue::new();
        let processor = Arc::new(Processor::new(config, registry, Arc::new(MemoryJobQueue::new()), stores));

        install_lifecycle_hooks(&job_queue, processor.clone(), Duration::from_secs(1));
        job_queue.fire_lifecycle(&LifecycleEvent::new(LifecycleSignal::Startup));

        assert_eq!(processor.state(), async_http_processor::ProcessorState::Running);
        processor.reset();
    }
}
