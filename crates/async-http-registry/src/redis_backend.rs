//! Redis-backed [`InflightBackend`], implementing the KV layout from §4.2:
//!
//! ```text
//! async_http:inflight                  sorted set  member=request_id, score=heartbeat_epoch_ms
//! async_http:inflight:<request_id>     hash        job_envelope, enqueued_at, owner_pid, retry_count
//! async_http:inflight:gc_lock          string      TTL=lock_ttl
//! ```

use crate::backend::{BackendError, InflightBackend};
use crate::entry::InflightEntry;
use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use uuid::Uuid;

const SET_KEY: &str = "async_http:inflight";
const GC_LOCK_KEY: &str = "async_http:inflight:gc_lock";

fn hash_key(id: Uuid) -> String {
    format!("async_http:inflight:{id}")
}

fn to_backend_err(e: redis::RedisError) -> BackendError {
    BackendError::Backend(e.to_string())
}

fn to_pool_err(e: deadpool_redis::PoolError) -> BackendError {
    BackendError::Backend(e.to_string())
}

/// Redis-backed registry storage, sharing a connection pool with anything
/// else the host configures against the same Redis instance (e.g. the
/// payload store).
pub struct RedisInflightBackend {
    pool: Pool,
}

impl RedisInflightBackend {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn entry_from_hash(
        &self,
        id: Uuid,
        conn: &mut deadpool_redis::Connection,
    ) -> Result<Option<InflightEntry>, BackendError> {
        let fields: std::collections::HashMap<String, String> = conn
            .hgetall(hash_key(id))
            .await
            .map_err(to_backend_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        let heartbeat: u64 = conn
            .zscore(SET_KEY, id.to_string())
            .await
            .map_err(to_backend_err)?;
        decode_entry(id, &fields, heartbeat)
    }
}

fn decode_entry(
    id: Uuid,
    fields: &std::collections::HashMap<String, String>,
    heartbeat_ms: u64,
) -> Result<Option<InflightEntry>, BackendError> {
    let job_envelope = fields
        .get("job_envelope")
        .map(|s| serde_json::from_str(s))
        .transpose()
        .map_err(|e| BackendError::Backend(e.to_string()))?
        .unwrap_or(serde_json::Value::Null);
    let enqueued_at_ms = fields
        .get("enqueued_at")
        .and_then(|s| s.parse().ok())
        .unwrap_or(heartbeat_ms);
    let owner_process_id = fields.get("owner_pid").cloned().unwrap_or_default();
    let retry_count = fields
        .get("retry_count")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(Some(InflightEntry {
        request_id: id,
        enqueued_at_ms,
        last_heartbeat_ms: heartbeat_ms,
        owner_process_id,
        job_envelope,
        retry_count,
    }))
}

#[async_trait]
impl InflightBackend for RedisInflightBackend {
    async fn register(&self, entry: InflightEntry) -> Result<(), BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let envelope = serde_json::to_string(&entry.job_envelope)
            .map_err(|e| BackendError::Backend(e.to_string()))?;

        redis::pipe()
            .atomic()
            .hset(hash_key(entry.request_id), "job_envelope", envelope)
            .ignore()
            .hset(
                hash_key(entry.request_id),
                "enqueued_at",
                entry.enqueued_at_ms,
            )
            .ignore()
            .hset(
                hash_key(entry.request_id),
                "owner_pid",
                entry.owner_process_id,
            )
            .ignore()
            .hset(hash_key(entry.request_id), "retry_count", entry.retry_count)
            .ignore()
            .zadd(SET_KEY, entry.request_id.to_string(), entry.last_heartbeat_ms)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_backend_err)?;
        Ok(())
    }

    async fn heartbeat(&self, ids: &[Uuid], now_ms: u64) -> Result<(), BackendError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let members: Vec<(u64, String)> = ids.iter().map(|id| (now_ms, id.to_string())).collect();
        let _: () = redis::cmd("ZADD")
            .arg(SET_KEY)
            .arg("XX")
            .arg(members)
            .query_async(&mut conn)
            .await
            .map_err(to_backend_err)?;
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        redis::pipe()
            .atomic()
            .del(hash_key(id))
            .ignore()
            .zrem(SET_KEY, id.to_string())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(to_backend_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<InflightEntry>, BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        self.entry_from_hash(id, &mut conn).await
    }

    async fn orphaned(
        &self,
        now_ms: u64,
        threshold_ms: u64,
    ) -> Result<Vec<InflightEntry>, BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let max_score = now_ms.saturating_sub(threshold_ms).saturating_sub(1);
        let ids: Vec<String> = conn
            .zrangebyscore(SET_KEY, 0, max_score)
            .await
            .map_err(to_backend_err)?;

        let mut orphans = Vec::with_capacity(ids.len());
        for raw in ids {
            let Ok(id) = Uuid::parse_str(&raw) else {
                continue;
            };
            if let Some(entry) = self.entry_from_hash(id, &mut conn).await? {
                orphans.push(entry);
            }
        }
        Ok(orphans)
    }

    async fn acquire_gc_lock(&self, owner: &str, ttl_ms: u64) -> Result<bool, BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let ttl_seconds = ttl_ms.div_ceil(1000).max(1);
        let acquired: Option<String> = redis::cmd("SET")
            .arg(GC_LOCK_KEY)
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(to_backend_err)?;
        Ok(acquired.is_some())
    }

    async fn release_gc_lock(&self, owner: &str) -> Result<(), BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let current: Option<String> = conn.get(GC_LOCK_KEY).await.map_err(to_backend_err)?;
        if current.as_deref() == Some(owner) {
            let _: () = conn.del(GC_LOCK_KEY).await.map_err(to_backend_err)?;
        }
        Ok(())
    }

    async fn owned_by(&self, owner_process_id: &str) -> Result<Vec<InflightEntry>, BackendError> {
        let mut conn = self.pool.get().await.map_err(to_pool_err)?;
        let ids: Vec<String> = conn
            .zrange(SET_KEY, 0, -1)
            .await
            .map_err(to_backend_err)?;
        let mut owned = Vec::new();
        for raw in ids {
            let Ok(id) = Uuid::parse_str(&raw) else {
                continue;
            };
            if let Some(entry) = self.entry_from_hash(id, &mut conn).await? {
                if entry.owner_process_id == owner_process_id {
                    owned.push(entry);
                }
            }
        }
        Ok(owned)
    }
}
