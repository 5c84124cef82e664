//! The payload store adapter trait (§6.3): `generate_key`, `store`,
//! `fetch`, `delete`, `exists`.

use async_trait::async_trait;
use serde_json::Value as Json;

/// Errors a [`PayloadStore`] adapter can raise.
#[derive(Debug, thiserror::Error)]
pub enum PayloadStoreError {
    #[error("payload key {0:?} not found")]
    NotFound(String),
    #[error("payload store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("payload store backend error: {0}")]
    Backend(String),
}

/// A pluggable key-value store adapter for oversized request/response
/// bodies, keyed by UUID.
///
/// Implementors: file (directory-based), shared KV (Redis), in-memory
/// (tests).
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// A stable name identifying this store instance, used in `$ref`
    /// markers (`{ "$ref": { "store": name, "key": ... } }`).
    fn name(&self) -> &str;

    /// Generates a fresh key for a new payload. Single-writer per key: the
    /// key is always a freshly generated UUID, so no two in-flight writers
    /// ever contend for the same key.
    fn generate_key(&self) -> String;

    /// Stores `value` under `key`, overwriting any previous value.
    async fn store(&self, key: &str, value: Json) -> Result<(), PayloadStoreError>;

    /// Fetches the value stored under `key`, or `None` if absent.
    async fn fetch(&self, key: &str) -> Result<Option<Json>, PayloadStoreError>;

    /// Deletes `key`. Idempotent: deleting an absent key is not an error,
    /// matching the "unstore is idempotent" requirement for callback
    /// cleanup on retry exhaustion.
    async fn delete(&self, key: &str) -> Result<(), PayloadStoreError>;

    /// True if `key` currently has a stored value.
    async fn exists(&self, key: &str) -> Result<bool, PayloadStoreError>;
}
