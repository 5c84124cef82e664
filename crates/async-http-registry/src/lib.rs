//! Cross-process inflight request registry.
//!
//! Wraps a shared KV store (Redis in production, an in-memory map in tests)
//! behind the [`InflightBackend`] trait, and layers the named registry
//! operations (`register`, `heartbeat`, `remove`, GC lock, orphan cleanup)
//! on top via [`InflightRegistry`].

pub mod backend;
pub mod config;
pub mod entry;
pub mod memory_backend;
#[cfg(feature = "redis-backend")]
pub mod redis_backend;
pub mod registry;

pub use backend::{BackendError, InflightBackend};
pub use config::{RegistryConfig, RegistryConfigBuilder, RegistryConfigError};
pub use entry::{now_ms, InflightEntry, JobEnvelopeBlob};
pub use memory_backend::MemoryInflightBackend;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisInflightBackend;
pub use registry::InflightRegistry;
