//! File-directory-backed payload store adapter.

use crate::store::{PayloadStore, PayloadStoreError};
use async_trait::async_trait;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// A [`PayloadStore`] that writes each payload as one JSON file inside a
/// directory.
pub struct FilePayloadStore {
    name: String,
    directory: PathBuf,
}

impl FilePayloadStore {
    /// Creates a store rooted at `directory`. The directory is not created
    /// eagerly; the first `store()` call creates it if missing.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PayloadStoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(PayloadStoreError::Backend(format!(
                "refusing unsafe payload key: {key:?}"
            )));
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir).await
}

#[async_trait]
impl PayloadStore for FilePayloadStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_key(&self) -> String {
        Uuid::new_v4().to_string()
    }

    async fn store(&self, key: &str, value: Json) -> Result<(), PayloadStoreError> {
        let path = self.path_for(key)?;
        ensure_dir(&self.directory).await?;
        let bytes = serde_json::to_vec(&value)?;
        fs::write(path, bytes).await?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Json>, PayloadStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), PayloadStoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, PayloadStoreError> {
        let path = self.path_for(key)?;
        Ok(fs::metadata(path).await.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stores_and_fetches_a_value() {
        let dir = tempdir().unwrap();
        let store = FilePayloadStore::new("file", dir.path());
        let key = store.generate_key();
        store.store(&key, serde_json::json!({"body": [1, 2, 3]})).await.unwrap();
        assert_eq!(
            store.fetch(&key).await.unwrap(),
            Some(serde_json::json!({"body": [1, 2, 3]}))
        );
    }

    #[tokio::test]
    async fn fetch_of_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FilePayloadStore::new("file", dir.path());
        assert_eq!(store.fetch("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let dir = tempdir().unwrap();
        let store = FilePayloadStore::new("file", dir.path());
        let err = store.store("../evil", serde_json::json!(null)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FilePayloadStore::new("file", dir.path());
        let key = store.generate_key();
        store.delete(&key).await.unwrap();
        store.store(&key, serde_json::json!(1)).await.unwrap();
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }
}
