//! The [`InflightBackend`] trait: the atomic KV operations §4.2 specifies
//! (sorted set + hash + GC lock), abstracted so the registry logic works
//! identically against Redis or an in-memory test double.

use crate::entry::InflightEntry;
use async_trait::async_trait;
use uuid::Uuid;

/// Errors a backend can raise.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("inflight registry backend error: {0}")]
    Backend(String),
}

/// The atomic primitives the inflight registry is built from.
///
/// Implementors must guarantee: `register` is atomic (the hash write and
/// the sorted-set add happen together or not at all); the sorted-set
/// score for a member is always its latest heartbeat; `acquire_gc_lock`
/// provides mutual exclusion across processes (property 4).
#[async_trait]
pub trait InflightBackend: Send + Sync {
    /// Registers a new entry (HSET + ZADD, atomically).
    async fn register(&self, entry: InflightEntry) -> Result<(), BackendError>;

    /// Updates the sorted-set score (heartbeat) for each id that already
    /// has a hash entry (`ZADD XX` semantics: ids with no existing member
    /// are silently skipped, never created).
    async fn heartbeat(&self, ids: &[Uuid], now_ms: u64) -> Result<(), BackendError>;

    /// Removes an entry's hash and sorted-set member.
    async fn remove(&self, id: Uuid) -> Result<(), BackendError>;

    /// Fetches a single entry by id, if present.
    async fn get(&self, id: Uuid) -> Result<Option<InflightEntry>, BackendError>;

    /// Returns every entry with a heartbeat score strictly less than
    /// `now_ms - threshold_ms`.
    async fn orphaned(
        &self,
        now_ms: u64,
        threshold_ms: u64,
    ) -> Result<Vec<InflightEntry>, BackendError>;

    /// Attempts to acquire the distributed GC lock; returns `true` if this
    /// caller now holds it.
    async fn acquire_gc_lock(&self, owner: &str, ttl_ms: u64) -> Result<bool, BackendError>;

    /// Releases the GC lock only if `owner` currently holds it.
    async fn release_gc_lock(&self, owner: &str) -> Result<(), BackendError>;

    /// Returns every entry currently owned by `owner_process_id`, used by
    /// shutdown to drain this process's own entries.
    async fn owned_by(&self, owner_process_id: &str) -> Result<Vec<InflightEntry>, BackendError>;
}
