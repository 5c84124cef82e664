//! Executor configuration: pooling limits, protocol opt-ins, proxy, and
//! redirect/size caps.

use crate::error::ExecutorError;
use std::time::Duration;

/// Tunables for the [`crate::executor::HttpExecutor`], mirroring §4.4.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    pub(crate) max_host_clients: usize,
    pub(crate) idle_connection_timeout: Duration,
    pub(crate) enable_http2: bool,
    pub(crate) proxy_url: Option<String>,
    pub(crate) max_response_size: u64,
    pub(crate) default_connect_timeout: Duration,
    pub(crate) default_timeout: Duration,
    pub(crate) default_max_redirects: u32,
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }

    pub fn max_host_clients(&self) -> usize {
        self.max_host_clients
    }

    pub fn idle_connection_timeout(&self) -> Duration {
        self.idle_connection_timeout
    }

    pub fn enable_http2(&self) -> bool {
        self.enable_http2
    }

    pub fn max_response_size(&self) -> u64 {
        self.max_response_size
    }
}

/// Builder for [`ExecutorConfig`].
pub struct ExecutorConfigBuilder {
    max_host_clients: usize,
    idle_connection_timeout: Duration,
    enable_http2: bool,
    proxy_url: Option<String>,
    max_response_size: u64,
    default_connect_timeout: Duration,
    default_timeout: Duration,
    default_max_redirects: u32,
}

impl ExecutorConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_host_clients: 64,
            idle_connection_timeout: Duration::from_secs(90),
            enable_http2: false,
            proxy_url: None,
            max_response_size: 20 * 1024 * 1024,
            default_connect_timeout: Duration::from_secs(10),
            default_timeout: Duration::from_secs(60),
            default_max_redirects: 10,
        }
    }

    /// Maximum number of distinct-origin `reqwest::Client`s kept alive at
    /// once, LRU-evicted beyond this. Default: 64.
    pub fn max_host_clients(mut self, max: usize) -> Self {
        self.max_host_clients = max;
        self
    }

    /// How long an origin's client may sit idle before eviction regardless
    /// of LRU pressure. Default: 90s.
    pub fn idle_connection_timeout(mut self, timeout: Duration) -> Self {
        self.idle_connection_timeout = timeout;
        self
    }

    /// Opt into HTTP/2 negotiation via ALPN. Default: false (HTTP/1.1 only).
    pub fn enable_http2(mut self, enabled: bool) -> Self {
        self.enable_http2 = enabled;
        self
    }

    /// Routes every request through this proxy. Basic auth embedded in the
    /// URL userinfo is honored. Default: None.
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Aborts the response body read once accumulated bytes exceed this.
    /// Default: 20 MiB.
    pub fn max_response_size(mut self, bytes: u64) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Default connect timeout used when a request doesn't override it.
    pub fn default_connect_timeout(mut self, timeout: Duration) -> Self {
        self.default_connect_timeout = timeout;
        self
    }

    /// Default overall timeout used when a request doesn't override it.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Default max redirect count used when a request doesn't override it.
    pub fn default_max_redirects(mut self, max: u32) -> Self {
        self.default_max_redirects = max;
        self
    }

    pub fn build(self) -> Result<ExecutorConfig, ExecutorError> {
        if self.max_host_clients == 0 {
            return Err(ExecutorError::ZeroMaxHostClients);
        }
        if self.max_response_size == 0 {
            return Err(ExecutorError::ZeroMaxResponseSize);
        }
        if let Some(proxy) = &self.proxy_url {
            url::Url::parse(proxy).map_err(|e| ExecutorError::InvalidProxyUrl(e.to_string()))?;
        }
        Ok(ExecutorConfig {
            max_host_clients: self.max_host_clients,
            idle_connection_timeout: self.idle_connection_timeout,
            enable_http2: self.enable_http2,
            proxy_url: self.proxy_url,
            max_response_size: self.max_response_size,
            default_connect_timeout: self.default_connect_timeout,
            default_timeout: self.default_timeout,
            default_max_redirects: self.default_max_redirects,
        })
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully() {
        let config = ExecutorConfig::builder().build().unwrap();
        assert_eq!(config.max_host_clients(), 64);
        assert!(!config.enable_http2());
    }

    #[test]
    fn zero_max_host_clients_is_rejected() {
        let err = ExecutorConfig::builder().max_host_clients(0).build().unwrap_err();
        assert!(matches!(err, ExecutorError::ZeroMaxHostClients));
    }

    #[test]
    fn invalid_proxy_url_is_rejected() {
        let err = ExecutorConfig::builder()
            .proxy_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidProxyUrl(_)));
    }
}
