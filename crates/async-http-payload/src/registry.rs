//! Named registry of configured [`PayloadStore`] adapters with one
//! designated default, per §6.3 (`register_payload_store(name, adapter,
//! options)`).

use crate::store::{PayloadStore, PayloadStoreError};
use std::collections::HashMap;
use std::sync::Arc;

/// Error raised by [`PayloadStoreRegistry`] lookups/registration.
#[derive(Debug, thiserror::Error)]
pub enum PayloadStoreRegistryError {
    #[error("no payload store registered under name {0:?}")]
    UnknownStore(String),
    #[error("no default payload store has been registered")]
    NoDefault,
    #[error("a payload store named {0:?} is already registered")]
    DuplicateName(String),
}

/// Holds every [`PayloadStore`] the host application has registered,
/// keyed by name, with one marked as the default used when no store is
/// explicitly named.
#[derive(Clone, Default)]
pub struct PayloadStoreRegistry {
    stores: HashMap<String, Arc<dyn PayloadStore>>,
    default_name: Option<String>,
}

impl PayloadStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` under its own `name()`. The first store
    /// registered becomes the default unless `set_default` is used or
    /// `default` is explicitly requested.
    pub fn register(
        &mut self,
        store: Arc<dyn PayloadStore>,
        default: bool,
    ) -> Result<(), PayloadStoreRegistryError> {
        let name = store.name().to_string();
        if self.stores.contains_key(&name) {
            return Err(PayloadStoreRegistryError::DuplicateName(name));
        }
        let is_first = self.stores.is_empty();
        self.stores.insert(name.clone(), store);
        if default || is_first {
            self.default_name = Some(name);
        }
        Ok(())
    }

    /// Looks up a store by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PayloadStore>, PayloadStoreRegistryError> {
        self.stores
            .get(name)
            .cloned()
            .ok_or_else(|| PayloadStoreRegistryError::UnknownStore(name.to_string()))
    }

    /// Returns the designated default store.
    pub fn default_store(&self) -> Result<Arc<dyn PayloadStore>, PayloadStoreRegistryError> {
        let name = self
            .default_name
            .as_ref()
            .ok_or(PayloadStoreRegistryError::NoDefault)?;
        self.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }
}
