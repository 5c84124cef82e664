//! [`Configuration`] and [`ConfigurationBuilder`]: the single entry point
//! `configure()` consumes to assemble a [`Processor`](async_http_processor::Processor)
//! and everything it needs — the inflight backend, the job queue
//! collaborator, payload stores, registered callback classes, and the
//! global before-hooks (§2, §4.5 step 3).

use crate::callback::{CallbackHandlerRegistry, Hooks};
use async_http_jobqueue::{CallbackError, CallbackHandler, JobQueue, MemoryJobQueue};
use async_http_payload::{MemoryPayloadStore, PayloadStore, PayloadStoreRegistry, PayloadStoreRegistryError};
use async_http_processor::{ProcessorConfig, ProcessorConfigBuilder, ProcessorConfigError};
use async_http_registry::{InflightBackend, MemoryInflightBackend};
use async_http_value::Response;
use std::sync::Arc;

/// Raised by [`ConfigurationBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Processor(#[from] ProcessorConfigError),
    #[error(transparent)]
    PayloadStore(#[from] PayloadStoreRegistryError),
}

/// Everything a configured runtime needs, built once by `configure()` and
/// never mutated afterward.
pub struct Configuration {
    pub(crate) processor_config: ProcessorConfig,
    pub(crate) inflight_backend: Arc<dyn InflightBackend>,
    pub(crate) job_queue: Arc<dyn JobQueue>,
    pub(crate) payload_stores: PayloadStoreRegistry,
    pub(crate) callback_handlers: CallbackHandlerRegistry,
    pub(crate) hooks: Hooks,
    pub(crate) owner_process_id: String,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }
}

/// Builder for [`Configuration`].
///
/// Defaults: an in-memory inflight backend ([`MemoryInflightBackend`]), an
/// in-memory job queue ([`MemoryJobQueue`]) for standalone testing, and a
/// single `"default"` [`MemoryPayloadStore`] if no store is registered
/// explicitly.
pub struct ConfigurationBuilder {
    processor: ProcessorConfigBuilder,
    inflight_backend: Arc<dyn InflightBackend>,
    job_queue: Arc<dyn JobQueue>,
    pending_stores: Vec<(Arc<dyn PayloadStore>, bool)>,
    callback_handlers: CallbackHandlerRegistry,
    hooks: Hooks,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::builder(),
            inflight_backend: Arc::new(MemoryInflightBackend::new()),
            job_queue: Arc::new(MemoryJobQueue::new()),
            pending_stores: Vec::new(),
            callback_handlers: CallbackHandlerRegistry::new(),
            hooks: Hooks::default(),
        }
    }
}

impl ConfigurationBuilder {
    /// Adjusts reactor tuning knobs via the underlying
    /// [`ProcessorConfigBuilder`].
    pub fn processor(mut self, f: impl FnOnce(ProcessorConfigBuilder) -> ProcessorConfigBuilder) -> Self {
        self.processor = f(self.processor);
        self
    }

    pub fn inflight_backend(mut self, backend: Arc<dyn InflightBackend>) -> Self {
        self.inflight_backend = backend;
        self
    }

    pub fn job_queue(mut self, job_queue: Arc<dyn JobQueue>) -> Self {
        self.job_queue = job_queue;
        self
    }

    /// Registers a payload store by name, per §6.3. The first store
    /// registered (across the whole builder) becomes the default unless
    /// `default` is set on a later call.
    pub fn register_payload_store(mut self, store: Arc<dyn PayloadStore>, default: bool) -> Self {
        self.pending_stores.push((store, default));
        self
    }

    /// Registers a callback handler under `name`, resolved later by a
    /// request's `callback_class_name`.
    pub fn register_callback(mut self, name: impl Into<String>, handler: Arc<dyn CallbackHandler>) -> Self {
        self.callback_handlers.register(name, handler);
        self
    }

    /// Adds a before-hook run ahead of every successful callback dispatch.
    pub fn after_completion(mut self, hook: impl Fn(&Response) + Send + Sync + 'static) -> Self {
        self.hooks.push_after_completion(hook);
        self
    }

    /// Adds a before-hook run ahead of every failed callback dispatch.
    pub fn after_error(mut self, hook: impl Fn(&CallbackError) + Send + Sync + 'static) -> Self {
        self.hooks.push_after_error(hook);
        self
    }

    pub fn build(self) -> Result<Configuration, ConfigurationError> {
        let processor_config = self.processor.build()?;
        let owner_process_id = processor_config.owner_process_id().to_string();

        let mut payload_stores = PayloadStoreRegistry::new();
        if self.pending_stores.is_empty() {
            payload_stores.register(Arc::new(MemoryPayloadStore::new("default")), true)?;
        } else {
            for (store, default) in self.pending_stores {
                payload_stores.register(store, default)?;
            }
        }

        Ok(Configuration {
            processor_config,
            inflight_backend: self.inflight_backend,
            job_queue: self.job_queue,
            payload_stores,
            callback_handlers: self.callback_handlers,
            hooks: self.hooks,
            owner_process_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully_with_a_default_payload_store() {
        let config = Configuration::builder().build().unwrap();
        assert!(config.payload_stores.default_store().is_ok());
    }

    #[test]
    fn explicit_payload_store_replaces_the_implicit_default() {
        let store = Arc::new(MemoryPayloadStore::new("primary"));
        let config = Configuration::builder()
            .register_payload_store(store, true)
            .build()
            .unwrap();
        assert_eq!(config.payload_stores.default_store().unwrap().name(), "primary");
        assert_eq!(config.payload_stores.len(), 1);
    }

    #[test]
    fn processor_closure_adjusts_reactor_tuning() {
        let config = Configuration::builder()
            .processor(|b| b.max_connections(5))
            .build()
            .unwrap();
        assert_eq!(config.processor_config.max_connections(), 5);
    }

    #[test]
    fn invalid_processor_tuning_surfaces_as_a_configuration_error() {
        let err = Configuration::builder()
            .processor(|b| b.max_connections(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Processor(_)));
    }
}
