//! The Monitor (§4.3): one cooperative background task per process,
//! refreshing heartbeats and running orphan GC under the distributed lock.
//! Sleeps are interruptible via a `watch` channel so `stop()` unblocks it
//! immediately rather than waiting out the current interval.

use crate::inflight::InflightSet;
use async_http_jobqueue::{JobEnvelope, JobQueue};
use async_http_registry::InflightRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running monitor task: `stop_tx` interrupts its sleep and
/// ends the loop; `join` resolves once it has actually stopped.
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    pub join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the monitor to stop and waits for its loop to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.join.await;
    }

    /// Test-only synchronous teardown: signals stop and aborts the task
    /// without waiting for it to actually exit.
    pub fn abort(self) {
        let _ = self.stop_tx.send(true);
        self.join.abort();
    }
}

/// Spawns the monitor loop on the current (reactor) runtime.
///
/// `test_mode`: a failed heartbeat or GC cycle panics the task instead of
/// being logged and swallowed, matching §4.3's "in a designated test mode
/// they re-raise" — callers can then observe the failure through the
/// `JoinHandle`.
pub fn spawn(
    registry: InflightRegistry,
    inflight: Arc<InflightSet>,
    job_queue: Arc<dyn JobQueue>,
    heartbeat_interval: Duration,
    gc_scan_interval: Duration,
    test_mode: bool,
) -> MonitorHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        let mut heartbeat_ticker = tokio::time::interval(heartbeat_interval);
        let mut gc_ticker = tokio::time::interval(gc_scan_interval);
        // Stagger the first GC tick so heartbeat and GC don't always land
        // on the same poll.
        gc_ticker.reset_after(gc_scan_interval / 2);

        loop {
            tokio::select! {
                _ = heartbeat_ticker.tick() => {
                    if let Err(e) = heartbeat_once(&registry, &inflight).await {
                        handle_failure(test_mode, "heartbeat", &e);
                    }
                }
                _ = gc_ticker.tick() => {
                    if let Err(e) = gc_once(&registry, job_queue.as_ref()).await {
                        handle_failure(test_mode, "gc", &e);
                    }
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    MonitorHandle { stop_tx, join }
}

async fn heartbeat_once(
    registry: &InflightRegistry,
    inflight: &InflightSet,
) -> Result<(), async_http_registry::BackendError> {
    let ids = inflight.ids();
    if ids.is_empty() {
        return Ok(());
    }
    registry.heartbeat(&ids).await
}

async fn gc_once(
    registry: &InflightRegistry,
    job_queue: &dyn JobQueue,
) -> Result<(), async_http_registry::BackendError> {
    if !registry.acquire_gc_lock().await? {
        return Ok(());
    }

    let orphaned = registry.cleanup_orphaned().await?;
    for entry in orphaned {
        if let Ok(mut envelope) = serde_json::from_value::<JobEnvelope>(entry.job_envelope.clone()) {
            envelope.retry_count = Some(entry.retry_count + 1);
            let _ = job_queue.push(envelope).await;
        }
        registry.remove(entry.request_id).await?;
    }

    registry.release_gc_lock().await?;
    Ok(())
}

fn handle_failure(test_mode: bool, phase: &str, error: &async_http_registry::BackendError) {
    if test_mode {
        panic!("async-http-processor monitor {phase} cycle failed: {error}");
    }
    #[cfg(feature = "tracing")]
    tracing::warn!(phase, %error, "monitor cycle failed, continuing");
    #[cfg(not(feature = "tracing"))]
    let _ = (phase, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_http_jobqueue::MemoryJobQueue;
    use async_http_registry::{MemoryInflightBackend, RegistryConfig};
    use uuid::Uuid;

    fn registry() -> InflightRegistry {
        InflightRegistry::new(
            Arc::new(MemoryInflightBackend::new()),
            RegistryConfig::builder()
                .heartbeat_interval(Duration::from_millis(20))
                .orphan_threshold(Duration::from_millis(100))
                .gc_lock_ttl(Duration::from_millis(200))
                .build()
                .unwrap(),
            "pid-test",
        )
    }

    #[tokio::test]
    async fn heartbeat_refreshes_local_inflight_ids() {
        let registry = registry();
        let id = Uuid::new_v4();
        registry.register(id, serde_json::json!({"class": "CallbackJob", "args": []})).await.unwrap();
        let inflight = Arc::new(InflightSet::new());
        heartbeat_once(&registry, &inflight).await.unwrap();

        let before = registry.get(id).await.unwrap().unwrap().last_heartbeat_ms;
        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.heartbeat(&[id]).await.unwrap();
        let after = registry.get(id).await.unwrap().unwrap().last_heartbeat_ms;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn orphaned_entries_are_re_enqueued_and_removed() {
        let registry = registry();
        let queue = Arc::new(MemoryJobQueue::new());
        let id = Uuid::new_v4();
        registry
            .register(id, serde_json::json!({"class": "CallbackJob", "args": []}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        gc_once(&registry, queue.as_ref()).await.unwrap();

        assert!(registry.get(id).await.unwrap().is_none());
        assert_eq!(queue.len(), 1);
    }
}
