//! Registry configuration: heartbeat cadence, orphan threshold, and GC lock
//! lifetime, validated together since the orphan threshold only makes sense
//! relative to how often entries are refreshed.

use std::time::Duration;

/// Raised when a [`RegistryConfig`] combination would be unsafe: notably, an
/// orphan threshold at or below the heartbeat interval would make
/// still-healthy entries look abandoned.
#[derive(Debug, thiserror::Error)]
pub enum RegistryConfigError {
    #[error("heartbeat_interval ({heartbeat:?}) must be strictly less than orphan_threshold ({orphan:?})")]
    HeartbeatNotBelowOrphanThreshold {
        heartbeat: Duration,
        orphan: Duration,
    },
    #[error("heartbeat_interval must be greater than zero")]
    ZeroHeartbeatInterval,
    #[error("gc_lock_ttl must be greater than zero")]
    ZeroGcLockTtl,
}

/// Tunables for the [`crate::registry::InflightRegistry`].
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub heartbeat_interval: Duration,
    pub orphan_threshold: Duration,
    pub gc_lock_ttl: Duration,
    pub gc_scan_interval: Duration,
}

impl RegistryConfig {
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            orphan_threshold: Duration::from_secs(90),
            gc_lock_ttl: Duration::from_secs(30),
            gc_scan_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegistryConfigBuilder {
    heartbeat_interval: Duration,
    orphan_threshold: Duration,
    gc_lock_ttl: Duration,
    gc_scan_interval: Duration,
}

impl Default for RegistryConfigBuilder {
    fn default() -> Self {
        let defaults = RegistryConfig::default();
        Self {
            heartbeat_interval: defaults.heartbeat_interval,
            orphan_threshold: defaults.orphan_threshold,
            gc_lock_ttl: defaults.gc_lock_ttl,
            gc_scan_interval: defaults.gc_scan_interval,
        }
    }
}

impl RegistryConfigBuilder {
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn orphan_threshold(mut self, threshold: Duration) -> Self {
        self.orphan_threshold = threshold;
        self
    }

    pub fn gc_lock_ttl(mut self, ttl: Duration) -> Self {
        self.gc_lock_ttl = ttl;
        self
    }

    pub fn gc_scan_interval(mut self, interval: Duration) -> Self {
        self.gc_scan_interval = interval;
        self
    }

    pub fn build(self) -> Result<RegistryConfig, RegistryConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(RegistryConfigError::ZeroHeartbeatInterval);
        }
        if self.gc_lock_ttl.is_zero() {
            return Err(RegistryConfigError::ZeroGcLockTtl);
        }
        if self.orphan_threshold <= self.heartbeat_interval {
            return Err(RegistryConfigError::HeartbeatNotBelowOrphanThreshold {
                heartbeat: self.heartbeat_interval,
                orphan: self.orphan_threshold,
            });
        }
        Ok(RegistryConfig {
            heartbeat_interval: self.heartbeat_interval,
            orphan_threshold: self.orphan_threshold,
            gc_lock_ttl: self.gc_lock_ttl,
            gc_scan_interval: self.gc_scan_interval,
        })
    }
}
