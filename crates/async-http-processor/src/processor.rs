//! [`Processor`]: the reactor (§4.1, §5). A singleton per process in
//! practice, but modeled as an ordinary value so tests can construct many
//! independent instances.
//!
//! The reactor runs on one dedicated OS thread hosting a `current_thread`
//! tokio runtime — the literal reading of §5's "one dedicated thread per
//! process hosting a cooperative, single-threaded I/O loop". Calling
//! threads (job workers) talk to it only through a bounded `mpsc` intake
//! channel; nothing about `enqueue` ever runs on the reactor thread itself.

use crate::backpressure::BackpressureStrategy;
use crate::config::ProcessorConfig;
use crate::dispatch;
use crate::error::ProcessorError;
use crate::inflight::{InflightSet, InflightTask};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::monitor::{self, MonitorHandle};
use crate::state::ProcessorState;
use async_http_client::HttpExecutor;
use async_http_jobqueue::{JobEnvelope, JobQueue};
use async_http_payload::PayloadStoreRegistry;
use async_http_registry::InflightRegistry;
use async_http_value::Request;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One accepted-but-not-yet-dispatched request, handed from a calling
/// thread to the reactor over the intake channel.
struct IntakeItem {
    request: Request,
    job_envelope: JobEnvelope,
}

/// The reactor. Construct with [`Processor::new`], call [`Processor::start`]
/// before any [`Processor::enqueue`], and [`Processor::stop`] (or, in
/// tests, [`Processor::reset`]) to tear it down.
pub struct Processor {
    config: ProcessorConfig,
    state: Arc<Mutex<ProcessorState>>,
    metrics: Arc<Metrics>,
    inflight: Arc<InflightSet>,
    registry: InflightRegistry,
    job_queue: Arc<dyn JobQueue>,
    payload_stores: Arc<PayloadStoreRegistry>,
    intake_tx: Mutex<Option<mpsc::Sender<IntakeItem>>>,
    monitor: Arc<Mutex<Option<MonitorHandle>>>,
    reactor_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl Processor {
    pub fn new(
        config: ProcessorConfig,
        registry: InflightRegistry,
        job_queue: Arc<dyn JobQueue>,
        payload_stores: PayloadStoreRegistry,
    ) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ProcessorState::Stopped)),
            metrics: Arc::new(Metrics::new()),
            inflight: Arc::new(InflightSet::new()),
            registry,
            job_queue,
            payload_stores: Arc::new(payload_stores),
            intake_tx: Mutex::new(None),
            monitor: Arc::new(Mutex::new(None)),
            reactor_thread: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProcessorState {
        *self.state.lock()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// `stopped -> starting -> running`. Spawns the reactor thread and its
    /// monitor; blocks briefly (no HTTP I/O, just thread/runtime setup)
    /// until the reactor is actually accepting work before returning.
    pub fn start(&self) -> Result<(), ProcessorError> {
        {
            let mut state = self.state.lock();
            state
                .checked_transition(ProcessorState::Starting)
                .map_err(|_| ProcessorError::AlreadyRunning)?;
        }

        let intake_capacity = (self.config.max_connections() * 2).max(1);
        let (intake_tx, intake_rx) = mpsc::channel(intake_capacity);
        *self.intake_tx.lock() = Some(intake_tx);

        let executor = Arc::new(HttpExecutor::new(self.config.executor_config()));
        let registry = self.registry.clone();
        let job_queue = self.job_queue.clone();
        let payload_stores = self.payload_stores.clone();
        let inflight = self.inflight.clone();
        let metrics = self.metrics.clone();
        let monitor_slot = self.monitor.clone();
        let state = self.state.clone();

        let heartbeat_interval = self.config.inflight_update_interval();
        let payload_store_threshold = self.config.payload_store_threshold();
        let monitor_heartbeat_interval = self.config.registry_config().heartbeat_interval;
        let gc_scan_interval = self.config.registry_config().gc_scan_interval;
        let test_mode = self.config.test_mode();

        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<()>(0);

        let thread = std::thread::Builder::new()
            .name("async-http-reactor".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build reactor runtime");

                runtime.block_on(async move {
                    let handle = monitor::spawn(
                        registry.clone(),
                        inflight.clone(),
                        job_queue.clone(),
                        monitor_heartbeat_interval,
                        gc_scan_interval,
                        test_mode,
                    );
                    *monitor_slot.lock() = Some(handle);
                    state
                        .lock()
                        .checked_transition(ProcessorState::Running)
                        .expect("starting -> running is always a legal transition here");
                    let _ = ready_tx.send(());

                    reactor_loop(
                        intake_rx,
                        executor,
                        registry,
                        job_queue,
                        payload_stores,
                        inflight,
                        metrics,
                        heartbeat_interval,
                        payload_store_threshold,
                    )
                    .await;
                });
            })
            .expect("failed to spawn reactor thread");

        let _ = ready_rx.recv();
        *self.reactor_thread.lock() = Some(thread);
        Ok(())
    }

    /// `running -> draining`: stop accepting new work, let in-flight
    /// requests finish.
    pub fn quiet(&self) -> Result<(), ProcessorError> {
        let mut state = self.state.lock();
        state
            .checked_transition(ProcessorState::Draining)
            .map_err(|state| ProcessorError::NotRunning { state })
    }

    /// `enqueue` contract (§4.1): requires `running`, applies the
    /// configured backpressure policy at capacity, registers the task
    /// locally and in the shared registry, then hands it to the reactor.
    /// Returns as soon as the registry write and channel send complete —
    /// it never waits for the HTTP exchange itself.
    pub async fn enqueue(&self, request: Request, job_envelope: JobEnvelope) -> Result<(), ProcessorError> {
        {
            let state = *self.state.lock();
            if state != ProcessorState::Running {
                return Err(ProcessorError::NotRunning { state });
            }
        }

        self.apply_backpressure().await?;

        self.registry
            .register(request.id, serde_json::to_value(&job_envelope).unwrap_or(serde_json::Value::Null))
            .await?;

        let sender = self
            .intake_tx
            .lock()
            .clone()
            .ok_or_else(|| ProcessorError::Internal("reactor intake channel is not open".to_string()))?;

        sender
            .send(IntakeItem { request, job_envelope })
            .await
            .map_err(|_| ProcessorError::Internal("reactor intake channel closed".to_string()))?;

        self.metrics.record_accepted();
        Ok(())
    }

    async fn apply_backpressure(&self) -> Result<(), ProcessorError> {
        loop {
            if self.inflight.len() < self.config.max_connections() {
                return Ok(());
            }
            match self.config.backpressure_strategy() {
                BackpressureStrategy::Raise => {
                    return Err(ProcessorError::MaxCapacity {
                        max_connections: self.config.max_connections(),
                    })
                }
                BackpressureStrategy::Block { timeout } => {
                    let deadline = Instant::now() + timeout;
                    loop {
                        if self.inflight.len() < self.config.max_connections() {
                            return Ok(());
                        }
                        if Instant::now() >= deadline {
                            return Err(ProcessorError::BackpressureTimeout(timeout));
                        }
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
                BackpressureStrategy::DropOldest => {
                    if let Some(oldest_id) = self.inflight.oldest() {
                        if let Some(task) = self.inflight.remove(&oldest_id) {
                            task.handle.abort();
                            self.metrics.record_left_in_flight();
                            let mut envelope = task.job_envelope;
                            envelope.retry_count = Some(envelope.retry_count.unwrap_or(0) + 1);
                            let _ = self.job_queue.push(envelope).await;
                            let _ = self.registry.remove(oldest_id).await;
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Shutdown algorithm (§4.1): `running`/`draining -> stopping`, wait up
    /// to `timeout` for in-flight work to finish naturally, cancel and
    /// re-enqueue whatever remains, drain this process's registry entries,
    /// stop the monitor, join the reactor thread, then `-> stopped`.
    pub async fn stop(&self, timeout: Duration) -> Result<(), ProcessorError> {
        {
            let mut state = self.state.lock();
            match *state {
                ProcessorState::Running | ProcessorState::Draining => state
                    .checked_transition(ProcessorState::Stopping)
                    .expect("running/draining -> stopping is always a legal transition here"),
                ProcessorState::Stopped => return Ok(()),
                other => return Err(ProcessorError::NotRunning { state: other }),
            }
        }

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline && !self.inflight.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut requeue_failures = 0u32;
        for (request_id, task) in self.inflight.drain() {
            task.handle.abort();
            self.metrics.record_left_in_flight();
            let mut envelope = task.job_envelope;
            envelope.retry_count = Some(envelope.retry_count.unwrap_or(0) + 1);
            if self.job_queue.push(envelope).await.is_err() {
                requeue_failures += 1;
            }
            let _ = self.registry.remove(request_id).await;
        }
        if requeue_failures > 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!(requeue_failures, "some shutdown-time re-enqueues failed");
        }

        if let Ok(owned) = self.registry.owned_entries().await {
            for entry in owned {
                let _ = self.registry.remove(entry.request_id).await;
            }
        }

        if let Some(handle) = self.monitor.lock().take() {
            handle.stop().await;
        }

        if let Some(tx) = self.intake_tx.lock().take() {
            drop(tx);
        }
        if let Some(thread) = self.reactor_thread.lock().take() {
            let _ = thread.join();
        }

        self.state
            .lock()
            .checked_transition(ProcessorState::Stopped)
            .expect("stopping -> stopped is always a legal transition here");
        Ok(())
    }

    /// Test-only synchronous teardown: aborts everything without waiting
    /// for graceful completion or re-enqueuing in-flight work. Never use
    /// this in production — it violates the at-least-once completion
    /// guarantee by design. Unlike every other transition here, this one
    /// goes through `force_to` rather than `checked_transition`: it must
    /// be able to snap back to `Stopped` from any state (§4.1's "no
    /// reverse transitions except via `reset!`").
    pub fn reset(&self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
        }
        for (_, task) in self.inflight.drain() {
            task.handle.abort();
            self.metrics.record_left_in_flight();
        }
        if let Some(tx) = self.intake_tx.lock().take() {
            drop(tx);
        }
        if let Some(thread) = self.reactor_thread.lock().take() {
            let _ = thread.join();
        }
        self.state.lock().force_to(ProcessorState::Stopped);
    }
}

#[allow(clippy::too_many_arguments)]
async fn reactor_loop(
    mut intake_rx: mpsc::Receiver<IntakeItem>,
    executor: Arc<HttpExecutor>,
    registry: InflightRegistry,
    job_queue: Arc<dyn JobQueue>,
    payload_stores: Arc<PayloadStoreRegistry>,
    inflight: Arc<InflightSet>,
    metrics: Arc<Metrics>,
    heartbeat_interval: Duration,
    payload_store_threshold: usize,
) {
    let mut heartbeat_ticker = tokio::time::interval(heartbeat_interval);

    loop {
        tokio::select! {
            item = intake_rx.recv() => {
                match item {
                    Some(item) => spawn_request(
                        item,
                        &executor,
                        &registry,
                        &job_queue,
                        &payload_stores,
                        payload_store_threshold,
                        &metrics,
                        &inflight,
                    ),
                    None => break,
                }
            }
            _ = heartbeat_ticker.tick() => {
                let ids = inflight.ids();
                if !ids.is_empty() {
                    let _ = registry.heartbeat(&ids).await;
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_request(
    item: IntakeItem,
    executor: &Arc<HttpExecutor>,
    registry: &InflightRegistry,
    job_queue: &Arc<dyn JobQueue>,
    payload_stores: &Arc<PayloadStoreRegistry>,
    payload_store_threshold: usize,
    metrics: &Arc<Metrics>,
    inflight: &Arc<InflightSet>,
) {
    let request_id = item.request.id;
    let enqueued_at = Instant::now();

    let executor = executor.clone();
    let registry = registry.clone();
    let job_queue = job_queue.clone();
    let payload_stores = payload_stores.clone();
    let metrics = metrics.clone();
    let inflight_for_task = inflight.clone();
    let request = item.request;
    let job_envelope = item.job_envelope;

    let handle = tokio::spawn(async move {
        run_one(
            request,
            executor,
            registry,
            job_queue,
            payload_stores,
            payload_store_threshold,
            metrics,
            inflight_for_task,
            request_id,
        )
        .await;
    });

    inflight.insert(
        request_id,
        InflightTask {
            handle,
            job_envelope,
            enqueued_at,
        },
    );
}

#[allow(clippy::too_many_arguments)]
async fn run_one(
    request: Request,
    executor: Arc<HttpExecutor>,
    registry: InflightRegistry,
    job_queue: Arc<dyn JobQueue>,
    payload_stores: Arc<PayloadStoreRegistry>,
    payload_store_threshold: usize,
    metrics: Arc<Metrics>,
    inflight: Arc<InflightSet>,
    request_id: Uuid,
) {
    let callback_class_name = request.callback_class_name.clone();
    let result = executor.execute(&request).await;
    let terminal = dispatch::build_terminal_value(&request, result);

    let dispatch_result = dispatch::dispatch(
        terminal,
        &callback_class_name,
        job_queue.as_ref(),
        payload_stores.as_ref(),
        payload_store_threshold,
        metrics.as_ref(),
    )
    .await;

    #[cfg(feature = "tracing")]
    if let Err(ref e) = dispatch_result {
        tracing::warn!(%e, %request_id, "callback dispatch failed");
    }
    #[cfg(not(feature = "tracing"))]
    let _ = &dispatch_result;

    let _ = registry.remove(request_id).await;
    inflight.remove(&request_id);
}
