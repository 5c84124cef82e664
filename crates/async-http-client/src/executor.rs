//! [`HttpExecutor`]: issues the wire-level request and returns a `Response`
//! or a classified failure, per §4.4.

use crate::classify::classify_reqwest_error;
use crate::config::ExecutorConfig;
use crate::error::ExecutionFailure;
use crate::pool::ClientPool;
use crate::redirect::{RedirectDecision, RedirectState};
use async_http_value::{Error as TransportError, ErrorType, Method, Request, Response};
use futures::StreamExt;
use std::time::Instant;

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// Executes requests against a pool of origin-scoped `reqwest::Client`s,
/// following redirects manually and enforcing the response size cap.
pub struct HttpExecutor {
    pool: ClientPool,
    max_response_size: u64,
}

impl HttpExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            pool: ClientPool::new(
                config.max_host_clients,
                config.idle_connection_timeout,
                config.enable_http2,
                config.proxy_url.clone(),
                config.default_connect_timeout,
            ),
            max_response_size: config.max_response_size,
        }
    }

    /// Executes `request`, following redirects, and returns the final
    /// `Response` or a classified [`ExecutionFailure`].
    pub async fn execute(&self, request: &Request) -> Result<Response, ExecutionFailure> {
        let start = Instant::now();
        let mut redirects = RedirectState::new(request.url.clone(), request.max_redirects);
        let mut current_url = request.url.clone();

        loop {
            let client = self
                .pool
                .client_for(&current_url)
                .map_err(|e| self.to_transport_error(request, start, &current_url, e.to_string(), ErrorType::Unknown))?;

            let mut builder = client
                .request(to_reqwest_method(request.method), current_url.clone())
                .timeout(request.timeout);

            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let send_result = builder.send().await;
            let response = match send_result {
                Ok(response) => response,
                Err(err) => {
                    return Err(self.to_transport_error(
                        request,
                        start,
                        &current_url,
                        err.to_string(),
                        classify_reqwest_error(&err),
                    ))
                }
            };

            let status = response.status();
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            match redirects.next(status, location.as_deref(), &current_url, request.id, request.method) {
                RedirectDecision::Follow(next_url) => {
                    current_url = next_url;
                    continue;
                }
                RedirectDecision::Violation(violation) => {
                    return Err(ExecutionFailure::Redirect(violation));
                }
                RedirectDecision::Stop => {
                    let visited = redirects.visited().to_vec();
                    return self.finish(request, start, current_url, response, visited).await;
                }
            }
        }
    }

    async fn finish(
        &self,
        request: &Request,
        start: Instant,
        url: url::Url,
        response: reqwest::Response,
        visited: Vec<url::Url>,
    ) -> Result<Response, ExecutionFailure> {
        let status = response.status().as_u16();
        let protocol = format!("{:?}", response.version());
        let mut headers = async_http_value::HttpHeaders::new();
        for (name, value) in response.headers().iter() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }

        let body = match self.read_body_capped(response).await {
            Ok(bytes) => bytes,
            Err(BodyReadFailure::TooLarge) => {
                return Err(self.to_transport_error(
                    request,
                    start,
                    &url,
                    crate::classify::ResponseTooLarge.to_string(),
                    ErrorType::ResponseTooLarge,
                ))
            }
            Err(BodyReadFailure::Stream(err)) => {
                return Err(self.to_transport_error(
                    request,
                    start,
                    &url,
                    err.to_string(),
                    classify_reqwest_error(&err),
                ))
            }
        };

        let response = Response::new(
            status,
            headers,
            Some(body),
            protocol,
            start.elapsed(),
            request.id,
            url,
            request.method,
            request.callback_args.clone(),
            redirects_excluding_final(visited),
        )
        .map_err(|e| {
            self.to_transport_error(request, start, &request.url, e.to_string(), ErrorType::Protocol)
        })?;

        Ok(response)
    }

    async fn read_body_capped(&self, response: reqwest::Response) -> Result<Vec<u8>, BodyReadFailure> {
        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(BodyReadFailure::Stream)?;
            buffer.extend_from_slice(&chunk);
            if buffer.len() as u64 > self.max_response_size {
                return Err(BodyReadFailure::TooLarge);
            }
        }
        Ok(buffer)
    }

    fn to_transport_error(
        &self,
        request: &Request,
        start: Instant,
        url: &url::Url,
        message: String,
        error_type: ErrorType,
    ) -> ExecutionFailure {
        ExecutionFailure::Transport(TransportError::new(
            transport_error_class_name(error_type),
            message,
            None,
            error_type,
            start.elapsed(),
            request.id,
            url.as_str(),
            request.method,
            request.callback_args.clone(),
        ))
    }
}

/// Why `read_body_capped` stopped reading short of a clean end-of-stream:
/// either we aborted ourselves at `max_response_size`, or the underlying
/// stream yielded an error mid-body (reset, TLS failure, truncated
/// transfer). Both are failures, never a truncated `Ok` body.
enum BodyReadFailure {
    TooLarge,
    Stream(reqwest::Error),
}

fn transport_error_class_name(error_type: ErrorType) -> &'static str {
    match error_type {
        ErrorType::Timeout => "TimeoutError",
        ErrorType::Ssl => "SslError",
        ErrorType::Connection => "ConnectionError",
        ErrorType::ResponseTooLarge => "ResponseTooLargeError",
        ErrorType::Redirect => "RedirectError",
        ErrorType::Protocol => "ProtocolError",
        ErrorType::Unknown => "UnknownError",
    }
}

/// The redirect chain recorded so far, excluding the final URL (which is
/// carried separately as `Response::url`).
fn redirects_excluding_final(mut visited: Vec<url::Url>) -> Vec<url::Url> {
    if !visited.is_empty() {
        visited.pop();
    }
    visited
}
