//! In-memory payload store adapter, used by tests and examples.

use crate::store::{PayloadStore, PayloadStoreError};
use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// An in-memory [`PayloadStore`] backed by a `HashMap` behind a mutex.
///
/// Never use this in production: its contents vanish when the process
/// exits, defeating the entire point of externalizing a payload.
pub struct MemoryPayloadStore {
    name: String,
    values: Mutex<HashMap<String, Json>>,
}

impl MemoryPayloadStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored, for test assertions.
    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PayloadStore for MemoryPayloadStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_key(&self) -> String {
        Uuid::new_v4().to_string()
    }

    async fn store(&self, key: &str, value: Json) -> Result<(), PayloadStoreError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Json>, PayloadStoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), PayloadStoreError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, PayloadStoreError> {
        Ok(self.values.lock().unwrap().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_fetches_a_value() {
        let store = MemoryPayloadStore::new("default");
        let key = store.generate_key();
        store.store(&key, serde_json::json!({"a": 1})).await.unwrap();
        assert_eq!(store.fetch(&key).await.unwrap(), Some(serde_json::json!({"a": 1})));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryPayloadStore::new("default");
        let key = store.generate_key();
        store.delete(&key).await.unwrap();
        store.store(&key, serde_json::json!(null)).await.unwrap();
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn generated_keys_are_unique() {
        let store = MemoryPayloadStore::new("default");
        let a = store.generate_key();
        let b = store.generate_key();
        assert_ne!(a, b);
    }
}
