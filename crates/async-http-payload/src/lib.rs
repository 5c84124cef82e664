//! Pluggable key-value payload stores holding oversized request/response
//! bodies by UUID key, keeping job arguments small (§4.5, §6.3).

pub mod file;
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis_store;
pub mod registry;
pub mod store;

pub use file::FilePayloadStore;
pub use memory::MemoryPayloadStore;
#[cfg(feature = "redis-backend")]
pub use redis_store::RedisPayloadStore;
pub use registry::{PayloadStoreRegistry, PayloadStoreRegistryError};
pub use store::{PayloadStore, PayloadStoreError};
