//! In-memory [`InflightBackend`], used by tests and single-process
//! deployments that don't need cross-process orphan recovery.

use crate::backend::{BackendError, InflightBackend};
use crate::entry::InflightEntry;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// An in-memory backend. The GC lock is a single `Mutex<Option<String>>`
/// holding the current owner's id, with no real TTL expiry (a crashed
/// "process" in-process is just a dropped struct, so lock leakage isn't
/// observable the way it would be across real processes).
#[derive(Default)]
pub struct MemoryInflightBackend {
    entries: DashMap<Uuid, InflightEntry>,
    gc_lock_owner: Mutex<Option<String>>,
}

impl MemoryInflightBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InflightBackend for MemoryInflightBackend {
    async fn register(&self, entry: InflightEntry) -> Result<(), BackendError> {
        self.entries.insert(entry.request_id, entry);
        Ok(())
    }

    async fn heartbeat(&self, ids: &[Uuid], now_ms: u64) -> Result<(), BackendError> {
        for id in ids {
            if let Some(mut entry) = self.entries.get_mut(id) {
                entry.last_heartbeat_ms = entry.last_heartbeat_ms.max(now_ms);
            }
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), BackendError> {
        self.entries.remove(&id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<InflightEntry>, BackendError> {
        Ok(self.entries.get(&id).map(|e| e.clone()))
    }

    async fn orphaned(
        &self,
        now_ms: u64,
        threshold_ms: u64,
    ) -> Result<Vec<InflightEntry>, BackendError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_orphan(now_ms, threshold_ms))
            .map(|e| e.clone())
            .collect())
    }

    async fn acquire_gc_lock(&self, owner: &str, _ttl_ms: u64) -> Result<bool, BackendError> {
        let mut guard = self.gc_lock_owner.lock().unwrap();
        match guard.as_ref() {
            Some(current) if current == owner => Ok(true),
            Some(_) => Ok(false),
            None => {
                *guard = Some(owner.to_string());
                Ok(true)
            }
        }
    }

    async fn release_gc_lock(&self, owner: &str) -> Result<(), BackendError> {
        let mut guard = self.gc_lock_owner.lock().unwrap();
        if guard.as_deref() == Some(owner) {
            *guard = None;
        }
        Ok(())
    }

    async fn owned_by(&self, owner_process_id: &str) -> Result<Vec<InflightEntry>, BackendError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.owner_process_id == owner_process_id)
            .map(|e| e.clone())
            .collect())
    }
}
