//! [`InflightRegistry`]: the named operations from §4.2, layered over any
//! [`InflightBackend`].

use crate::backend::{BackendError, InflightBackend};
use crate::config::RegistryConfig;
use crate::entry::{now_ms, InflightEntry, JobEnvelopeBlob};
use std::sync::Arc;
use uuid::Uuid;

/// Tracks every request this process has accepted but not yet completed, in
/// a store shared across the whole job-worker fleet.
///
/// Cloning an `InflightRegistry` is cheap and shares the same backend and
/// config (it is an `Arc` handle).
#[derive(Clone)]
pub struct InflightRegistry {
    backend: Arc<dyn InflightBackend>,
    config: RegistryConfig,
    owner_process_id: String,
}

impl InflightRegistry {
    pub fn new(
        backend: Arc<dyn InflightBackend>,
        config: RegistryConfig,
        owner_process_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            config,
            owner_process_id: owner_process_id.into(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn owner_process_id(&self) -> &str {
        &self.owner_process_id
    }

    /// Registers `request_id` as newly accepted, recording `job_envelope` so
    /// it can be re-enqueued if this process dies before completion.
    pub async fn register(
        &self,
        request_id: Uuid,
        job_envelope: JobEnvelopeBlob,
    ) -> Result<(), BackendError> {
        let entry = InflightEntry::new(request_id, now_ms(), &self.owner_process_id, job_envelope);
        self.backend.register(entry).await
    }

    /// Refreshes the heartbeat for every id in `request_ids` still
    /// registered; unknown ids are silently skipped (they may have already
    /// completed and been removed).
    pub async fn heartbeat(&self, request_ids: &[Uuid]) -> Result<(), BackendError> {
        self.backend.heartbeat(request_ids, now_ms()).await
    }

    /// Removes an entry on normal completion.
    pub async fn remove(&self, request_id: Uuid) -> Result<(), BackendError> {
        self.backend.remove(request_id).await
    }

    pub async fn get(&self, request_id: Uuid) -> Result<Option<InflightEntry>, BackendError> {
        self.backend.get(request_id).await
    }

    /// Attempts to become the GC owner for this scan cycle.
    pub async fn acquire_gc_lock(&self) -> Result<bool, BackendError> {
        self.backend
            .acquire_gc_lock(&self.owner_process_id, self.config.gc_lock_ttl.as_millis() as u64)
            .await
    }

    pub async fn release_gc_lock(&self) -> Result<(), BackendError> {
        self.backend.release_gc_lock(&self.owner_process_id).await
    }

    /// Returns every entry whose heartbeat is older than `orphan_threshold`,
    /// for the GC owner to re-enqueue.
    pub async fn cleanup_orphaned(&self) -> Result<Vec<InflightEntry>, BackendError> {
        self.backend
            .orphaned(now_ms(), self.config.orphan_threshold.as_millis() as u64)
            .await
    }

    /// Returns every entry this process currently owns, for shutdown-time
    /// draining (re-enqueue everything still in flight locally).
    pub async fn owned_entries(&self) -> Result<Vec<InflightEntry>, BackendError> {
        self.backend.owned_by(&self.owner_process_id).await
    }
}
