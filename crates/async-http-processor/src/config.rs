//! [`ProcessorConfig`]: the validated bundle of tuning knobs the reactor
//! runs with — executor and registry sub-configs, capacity, backpressure,
//! reactor timings (§4.1), and the payload externalization threshold
//! (§4.5).

use crate::backpressure::BackpressureStrategy;
use async_http_client::ExecutorConfig;
use async_http_registry::RegistryConfig;
use std::time::Duration;
use uuid::Uuid;

/// Raised by [`ProcessorConfigBuilder::build`] when a combination of knobs
/// would be unsafe or meaningless.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorConfigError {
    #[error("max_connections must be greater than zero")]
    ZeroMaxConnections,
    #[error("dequeue_timeout must be greater than zero")]
    ZeroDequeueTimeout,
    #[error("inflight_update_interval must be greater than zero")]
    ZeroInflightUpdateInterval,
    #[error("tick_interval must be greater than zero")]
    ZeroTickInterval,
}

/// Tunables for the [`crate::processor::Processor`] reactor.
#[derive(Clone)]
pub struct ProcessorConfig {
    pub(crate) executor_config: ExecutorConfig,
    pub(crate) registry_config: RegistryConfig,
    pub(crate) max_connections: usize,
    pub(crate) backpressure_strategy: BackpressureStrategy,
    pub(crate) dequeue_timeout: Duration,
    pub(crate) inflight_update_interval: Duration,
    pub(crate) tick_interval: Duration,
    pub(crate) payload_store_threshold: usize,
    pub(crate) owner_process_id: String,
    pub(crate) test_mode: bool,
}

impl ProcessorConfig {
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    pub fn executor_config(&self) -> &ExecutorConfig {
        &self.executor_config
    }

    pub fn registry_config(&self) -> &RegistryConfig {
        &self.registry_config
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn backpressure_strategy(&self) -> BackpressureStrategy {
        self.backpressure_strategy
    }

    pub fn dequeue_timeout(&self) -> Duration {
        self.dequeue_timeout
    }

    pub fn inflight_update_interval(&self) -> Duration {
        self.inflight_update_interval
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn payload_store_threshold(&self) -> usize {
        self.payload_store_threshold
    }

    pub fn owner_process_id(&self) -> &str {
        &self.owner_process_id
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

/// Builder for [`ProcessorConfig`].
///
/// Defaults: `max_connections = 25`, `backpressure_strategy = Raise`,
/// `dequeue_timeout = 100ms` (T_dequeue), `inflight_update_interval = 5s`
/// (T_inflight_update), `tick_interval = 10ms` (T_tick),
/// `payload_store_threshold = 16 KiB`, `owner_process_id` a fresh UUID,
/// `test_mode = false`.
pub struct ProcessorConfigBuilder {
    executor_config: ExecutorConfig,
    registry_config: RegistryConfig,
    max_connections: usize,
    backpressure_strategy: BackpressureStrategy,
    dequeue_timeout: Duration,
    inflight_update_interval: Duration,
    tick_interval: Duration,
    payload_store_threshold: usize,
    owner_process_id: String,
    test_mode: bool,
}

impl Default for ProcessorConfigBuilder {
    fn default() -> Self {
        Self {
            executor_config: ExecutorConfig::builder()
                .build()
                .expect("default ExecutorConfig is always valid"),
            registry_config: RegistryConfig::default(),
            max_connections: 25,
            backpressure_strategy: BackpressureStrategy::default(),
            dequeue_timeout: Duration::from_millis(100),
            inflight_update_interval: Duration::from_secs(5),
            tick_interval: Duration::from_millis(10),
            payload_store_threshold: 16 * 1024,
            owner_process_id: Uuid::new_v4().to_string(),
            test_mode: false,
        }
    }
}

impl ProcessorConfigBuilder {
    pub fn executor_config(mut self, config: ExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn backpressure_strategy(mut self, strategy: BackpressureStrategy) -> Self {
        self.backpressure_strategy = strategy;
        self
    }

    pub fn dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    pub fn inflight_update_interval(mut self, interval: Duration) -> Self {
        self.inflight_update_interval = interval;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn payload_store_threshold(mut self, threshold: usize) -> Self {
        self.payload_store_threshold = threshold;
        self
    }

    pub fn owner_process_id(mut self, id: impl Into<String>) -> Self {
        self.owner_process_id = id.into();
        self
    }

    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn build(self) -> Result<ProcessorConfig, ProcessorConfigError> {
        if self.max_connections == 0 {
            return Err(ProcessorConfigError::ZeroMaxConnections);
        }
        if self.dequeue_timeout.is_zero() {
            return Err(ProcessorConfigError::ZeroDequeueTimeout);
        }
        if self.inflight_update_interval.is_zero() {
            return Err(ProcessorConfigError::ZeroInflightUpdateInterval);
        }
        if self.tick_interval.is_zero() {
            return Err(ProcessorConfigError::ZeroTickInterval);
        }
        Ok(ProcessorConfig {
            executor_config: self.executor_config,
            registry_config: self.registry_config,
            max_connections: self.max_connections,
            backpressure_strategy: self.backpressure_strategy,
            dequeue_timeout: self.dequeue_timeout,
            inflight_update_interval: self.inflight_update_interval,
            tick_interval: self.tick_interval,
            payload_store_threshold: self.payload_store_threshold,
            owner_process_id: self.owner_process_id,
            test_mode: self.test_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully() {
        let config = ProcessorConfig::builder().build().unwrap();
        assert_eq!(config.max_connections(), 25);
        assert_eq!(config.backpressure_strategy(), BackpressureStrategy::Raise);
    }

    #[test]
    fn zero_max_connections_is_rejected() {
        let err = ProcessorConfig::builder().max_connections(0).build().unwrap_err();
        assert!(matches!(err, ProcessorConfigError::ZeroMaxConnections));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = ProcessorConfig::builder()
            .tick_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ProcessorConfigError::ZeroTickInterval));
    }
}
