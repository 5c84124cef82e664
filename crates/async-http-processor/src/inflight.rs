//! The Processor's local in-flight set (§5): a concurrent map from
//! `request_id` to the running task's cancellation handle and original job
//! envelope, so shutdown can cancel-and-re-enqueue anything still running
//! past the deadline.

use async_http_jobqueue::JobEnvelope;
use dashmap::DashMap;
use std::time::Instant;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One locally-running request: its cooperative task handle (abort()-able
/// on shutdown timeout) and the envelope to re-enqueue if it is cancelled.
pub struct InflightTask {
    pub handle: JoinHandle<()>,
    pub job_envelope: JobEnvelope,
    pub enqueued_at: Instant,
}

/// The reactor-thread-owned set of currently-running requests.
///
/// Entries are added by intake and removed by completion, both on the
/// reactor thread; the monitor only reads a consistent snapshot of the ids.
#[derive(Default)]
pub struct InflightSet {
    tasks: DashMap<Uuid, InflightTask>,
}

impl InflightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request_id: Uuid, task: InflightTask) {
        self.tasks.insert(request_id, task);
    }

    pub fn remove(&self, request_id: &Uuid) -> Option<InflightTask> {
        self.tasks.remove(request_id).map(|(_, task)| task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// A snapshot of every id currently running, for heartbeat refresh.
    pub fn ids(&self) -> Vec<Uuid> {
        self.tasks.iter().map(|entry| *entry.key()).collect()
    }

    /// The id of the longest-queued entry, for `DropOldest` backpressure.
    pub fn oldest(&self) -> Option<Uuid> {
        self.tasks
            .iter()
            .min_by_key(|entry| entry.value().enqueued_at)
            .map(|entry| *entry.key())
    }

    /// Removes and returns every remaining task, for shutdown-time
    /// cancellation.
    pub fn drain(&self) -> Vec<(Uuid, InflightTask)> {
        let ids: Vec<Uuid> = self.ids();
        ids.into_iter()
            .filter_map(|id| self.remove(&id).map(|task| (id, task)))
            .collect()
    }
}
