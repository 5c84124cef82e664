//! `InflightEntry`: the shared-KV record of one accepted-but-unfinished
//! request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, serialized form of whatever the host job queue needs to
/// re-enqueue a task (its `class`, `args`, and any metadata) — see
/// `async-http-jobqueue::JobEnvelope`. Kept as an opaque JSON blob here so
/// this crate never depends on the job-queue crate.
pub type JobEnvelopeBlob = serde_json::Value;

/// A single in-flight request as recorded in the shared KV registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InflightEntry {
    pub request_id: Uuid,
    /// Wall-clock epoch milliseconds when the entry was first registered.
    pub enqueued_at_ms: u64,
    /// Wall-clock epoch milliseconds of the most recent heartbeat; this is
    /// always the sorted-set score for `request_id`.
    pub last_heartbeat_ms: u64,
    /// Identifies the process that owns this entry; only that process may
    /// remove it during normal completion.
    pub owner_process_id: String,
    /// The serialized job envelope, re-pushed verbatim on orphan recovery
    /// or shutdown-time re-enqueue.
    pub job_envelope: JobEnvelopeBlob,
    /// Incremented every time this entry's envelope is re-enqueued.
    pub retry_count: u32,
}

impl InflightEntry {
    pub fn new(
        request_id: Uuid,
        now_ms: u64,
        owner_process_id: impl Into<String>,
        job_envelope: JobEnvelopeBlob,
    ) -> Self {
        Self {
            request_id,
            enqueued_at_ms: now_ms,
            last_heartbeat_ms: now_ms,
            owner_process_id: owner_process_id.into(),
            job_envelope,
            retry_count: 0,
        }
    }

    /// True if `now_ms - last_heartbeat_ms` exceeds `threshold_ms`.
    pub fn is_orphan(&self, now_ms: u64, threshold_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heartbeat_ms) > threshold_ms
    }
}

/// Returns the current wall-clock time as epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as u64
}
