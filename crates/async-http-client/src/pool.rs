//! LRU pool of `reqwest::Client`s keyed by origin.
//!
//! A single shared `reqwest::Client` already pools connections internally,
//! but it pools every origin together with no per-origin cap or eviction.
//! Keeping one client per `(scheme, host, port)` lets us bound total
//! clients at `max_host_clients` and evict idle origins independently.

use crate::error::ExecutorError;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct OriginKey {
    scheme: String,
    host: String,
    port: u16,
}

impl OriginKey {
    fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }
}

struct PooledClient {
    client: Client,
    last_used: Instant,
}

/// Builds and caches `reqwest::Client`s per origin.
///
/// Construction of a `Client` is itself cheap in `reqwest` (it's lazy about
/// connections), so the pool just exists to bound how many distinct clients
/// accumulate and to give idle origins a clear eviction point.
pub struct ClientPool {
    max_clients: usize,
    idle_timeout: Duration,
    enable_http2: bool,
    proxy_url: Option<String>,
    connect_timeout: Duration,
    clients: Mutex<HashMap<OriginKey, PooledClient>>,
}

impl ClientPool {
    pub fn new(
        max_clients: usize,
        idle_timeout: Duration,
        enable_http2: bool,
        proxy_url: Option<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            max_clients,
            idle_timeout,
            enable_http2,
            proxy_url,
            connect_timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the client for `url`'s origin, building and inserting it if
    /// absent, evicting the least-recently-used entry if at capacity.
    pub fn client_for(&self, url: &Url) -> Result<Client, ExecutorError> {
        let key = OriginKey::from_url(url)
            .ok_or_else(|| ExecutorError::ClientBuild(format!("url has no host: {url}")))?;

        let mut clients = self.clients.lock();
        self.evict_idle(&mut clients);

        if let Some(entry) = clients.get_mut(&key) {
            entry.last_used = Instant::now();
            return Ok(entry.client.clone());
        }

        if clients.len() >= self.max_clients {
            if let Some(lru_key) = clients
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            {
                clients.remove(&lru_key);
            }
        }

        let client = self.build_client()?;
        clients.insert(
            key,
            PooledClient {
                client: client.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(client)
    }

    fn evict_idle(&self, clients: &mut HashMap<OriginKey, PooledClient>) {
        let idle_timeout = self.idle_timeout;
        let now = Instant::now();
        clients.retain(|_, entry| now.duration_since(entry.last_used) < idle_timeout);
    }

    fn build_client(&self) -> Result<Client, ExecutorError> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(Some(self.idle_timeout));

        if self.enable_http2 {
            builder = builder.use_rustls_tls();
        } else {
            builder = builder.http1_only();
        }

        if let Some(proxy_url) = &self.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| ExecutorError::InvalidProxyUrl(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| ExecutorError::ClientBuild(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
