//! Errors the executor itself can raise, distinct from the transport
//! [`async_http_value::Error`] / [`async_http_value::HttpError`] values that
//! describe a *request's* outcome.

/// Raised by configuration builders and pool plumbing, never by a request
/// outcome (those become `async_http_value::Error`/`HttpError` instead).
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("max_host_clients must be greater than zero")]
    ZeroMaxHostClients,
    #[error("max_response_size must be greater than zero")]
    ZeroMaxResponseSize,
    #[error("invalid proxy_url: {0}")]
    InvalidProxyUrl(String),
    #[error("failed to build reqwest client: {0}")]
    ClientBuild(String),
}

/// The two ways a request can fail to produce a `Response`: as a transport
/// error (classified per §4.4) or as a redirect-chain violation.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionFailure {
    #[error(transparent)]
    Transport(#[from] async_http_value::Error),
    #[error(transparent)]
    Redirect(#[from] async_http_value::RedirectError),
}
