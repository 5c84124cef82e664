//! Redis-backed payload store adapter, grounded on the `deadpool-redis`
//! connection-pool pattern used for the shared KV elsewhere in the stack
//! (see `async-http-registry`'s redis backend).

use crate::store::{PayloadStore, PayloadStoreError};
use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use serde_json::Value as Json;
use uuid::Uuid;

/// A [`PayloadStore`] backed by a Redis (or Redis-compatible) server,
/// with an optional TTL applied to every write.
///
/// TTL should be set to at least the host job queue's maximum
/// callback-retry horizon (§9 open question): an expired payload whose
/// callback job is still retrying will fail to load with
/// [`PayloadStoreError::NotFound`].
pub struct RedisPayloadStore {
    name: String,
    pool: Pool,
    key_prefix: String,
    ttl_seconds: Option<u64>,
}

impl RedisPayloadStore {
    pub fn new(name: impl Into<String>, pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool,
            key_prefix: key_prefix.into(),
            ttl_seconds: None,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl PayloadStore for RedisPayloadStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_key(&self) -> String {
        Uuid::new_v4().to_string()
    }

    async fn store(&self, key: &str, value: Json) -> Result<(), PayloadStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        let bytes = serde_json::to_vec(&value)?;
        let redis_key = self.redis_key(key);
        match self.ttl_seconds {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(&redis_key, bytes, ttl)
                    .await
                    .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(&redis_key, bytes)
                    .await
                    .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Json>, PayloadStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        let bytes: Option<Vec<u8>> = conn
            .get(self.redis_key(key))
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), PayloadStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        let _: () = conn
            .del(self.redis_key(key))
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, PayloadStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        let exists: bool = conn
            .exists(self.redis_key(key))
            .await
            .map_err(|e| PayloadStoreError::Backend(e.to_string()))?;
        Ok(exists)
    }
}
