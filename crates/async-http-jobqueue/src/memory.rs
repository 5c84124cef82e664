//! In-memory reference [`JobQueue`], used by tests (and suitable for a
//! single-process deployment with no real worker pool).

use crate::envelope::JobEnvelope;
use crate::queue::{JobMiddleware, JobQueue, JobQueueError, LifecycleEvent};
use async_http_core::events::EventListeners;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Pushed envelopes accumulate in `pushed`; a test drains them to simulate
/// a worker running each job. Middleware is invoked around `run_next`
/// rather than around a real worker loop, since there is none here.
pub struct MemoryJobQueue {
    pushed: Mutex<Vec<JobEnvelope>>,
    middleware: Mutex<Vec<Arc<dyn JobMiddleware>>>,
    lifecycle_listeners: Mutex<EventListeners<LifecycleEvent>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self {
            pushed: Mutex::new(Vec::new()),
            middleware: Mutex::new(Vec::new()),
            lifecycle_listeners: Mutex::new(EventListeners::new()),
        }
    }

    /// Removes and returns every envelope pushed so far, in push order.
    pub fn drain(&self) -> Vec<JobEnvelope> {
        std::mem::take(&mut self.pushed.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the registered middleware's `before_execute`/`after_execute`
    /// hooks around `envelope`, simulating one worker pass.
    pub fn run_middleware_around(&self, envelope: &JobEnvelope) {
        let middleware = self.middleware.lock().unwrap();
        for m in middleware.iter() {
            m.before_execute(envelope);
        }
        for m in middleware.iter().rev() {
            m.after_execute(envelope);
        }
    }

    /// Simulates the host emitting a lifecycle signal.
    pub fn fire_lifecycle(&self, event: &LifecycleEvent) {
        self.lifecycle_listeners.lock().unwrap().emit(event);
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn push(&self, envelope: JobEnvelope) -> Result<(), JobQueueError> {
        self.pushed.lock().unwrap().push(envelope);
        Ok(())
    }

    fn register_middleware(&self, middleware: Arc<dyn JobMiddleware>) {
        self.middleware.lock().unwrap().push(middleware);
    }

    fn on_lifecycle(&self, f: Box<dyn Fn(&LifecycleEvent) + Send + Sync>) {
        self.lifecycle_listeners
            .lock()
            .unwrap()
            .add(async_http_core::events::FnListener::new(move |event: &LifecycleEvent| {
                f(event)
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::LifecycleSignal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn push_accumulates_envelopes_in_order() {
        let queue = MemoryJobQueue::new();
        queue.push(JobEnvelope::new("First", vec![])).await.unwrap();
        queue.push(JobEnvelope::new("Second", vec![])).await.unwrap();
        let drained = queue.drain();
        assert_eq!(drained[0].class, "First");
        assert_eq!(drained[1].class, "Second");
        assert!(queue.is_empty());
    }

    struct RecordingMiddleware(Arc<AtomicUsize>);

    impl JobMiddleware for RecordingMiddleware {
        fn before_execute(&self, _envelope: &JobEnvelope) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn after_execute(&self, _envelope: &JobEnvelope) {
            self.0.fetch_add(10, Ordering::SeqCst);
        }
    }

    #[test]
    fn middleware_runs_before_and_after() {
        let counter = Arc::new(AtomicUsize::new(0));
        let queue = MemoryJobQueue::new();
        queue.register_middleware(Arc::new(RecordingMiddleware(counter.clone())));
        queue.run_middleware_around(&JobEnvelope::new("Job", vec![]));
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn lifecycle_listeners_receive_the_fired_signal() {
        let queue = MemoryJobQueue::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        queue.on_lifecycle(Box::new(move |event: &LifecycleEvent| {
            *seen_clone.lock().unwrap() = Some(event.signal);
        }));
        queue.fire_lifecycle(&LifecycleEvent::new(LifecycleSignal::Quiet));
        assert_eq!(*seen.lock().unwrap(), Some(LifecycleSignal::Quiet));
    }
}
