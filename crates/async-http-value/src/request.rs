//! Immutable `Request` value and its builder.

use crate::callback_args::CallbackArgs;
use crate::headers::HttpHeaders;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// HTTP methods the processor will execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// True for methods that must not carry a request body, per the data
    /// model invariant (`GET`/`DELETE`/`HEAD`/`OPTIONS` forbid body).
    pub fn forbids_body(self) -> bool {
        matches!(
            self,
            Method::Get | Method::Delete | Method::Head | Method::Options
        )
    }

    /// Lowercase wire form, e.g. `"get"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised while constructing a [`Request`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestBuildError {
    #[error("url must be absolute: {0}")]
    UrlNotAbsolute(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("{method} requests must not carry a body")]
    BodyForbidden { method: Method },
    #[error("timeout must be greater than zero")]
    NonPositiveTimeout,
    #[error("connect_timeout must be greater than zero")]
    NonPositiveConnectTimeout,
    #[error("max_redirects must be representable as u32")]
    InvalidMaxRedirects,
}

/// An immutable, validated outbound HTTP request.
///
/// Constructed only through [`RequestBuilder`]; once built, every field is
/// fixed for the lifetime of the value, and `id` is unique for the lifetime
/// of the process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub method: Method,
    #[serde(with = "crate::serde_url::single")]
    pub url: Url,
    pub headers: HttpHeaders,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: u32,
    pub raise_error_responses: bool,
    pub callback_class_name: String,
    pub callback_args: CallbackArgs,
}

impl Request {
    /// Starts building a new request.
    pub fn builder(method: Method, url: impl AsRef<str>) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.method == other.method
            && self.url == other.url
            && self.headers == other.headers
            && self.body == other.body
            && self.timeout == other.timeout
            && self.connect_timeout == other.connect_timeout
            && self.max_redirects == other.max_redirects
            && self.raise_error_responses == other.raise_error_responses
            && self.callback_class_name == other.callback_class_name
            && self.callback_args == other.callback_args
    }
}

/// Builder for [`Request`], the only way to construct one.
///
/// Defaults: `timeout = 60s`, `connect_timeout = 10s`, `max_redirects = 10`,
/// `raise_error_responses = false`.
pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: HttpHeaders,
    body: Option<Vec<u8>>,
    timeout: Duration,
    connect_timeout: Duration,
    max_redirects: u32,
    raise_error_responses: bool,
    callback_class_name: Option<String>,
    callback_args: CallbackArgs,
}

impl RequestBuilder {
    fn new(method: Method, url: impl AsRef<str>) -> Self {
        Self {
            method,
            url: url.as_ref().to_string(),
            headers: HttpHeaders::new(),
            body: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            raise_error_responses: false,
            callback_class_name: None,
            callback_args: CallbackArgs::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn headers(mut self, headers: HttpHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn raise_error_responses(mut self, raise: bool) -> Self {
        self.raise_error_responses = raise;
        self
    }

    pub fn callback_class_name(mut self, name: impl Into<String>) -> Self {
        self.callback_class_name = Some(name.into());
        self
    }

    pub fn callback_args(mut self, args: CallbackArgs) -> Self {
        self.callback_args = args;
        self
    }

    /// Validates and constructs the immutable [`Request`].
    pub fn build(self) -> Result<Request, RequestBuildError> {
        let url = Url::parse(&self.url).map_err(|e| RequestBuildError::InvalidUrl(e.to_string()))?;
        if url.cannot_be_a_base() || (url.scheme() != "http" && url.scheme() != "https") {
            return Err(RequestBuildError::UrlNotAbsolute(self.url));
        }
        if self.body.is_some() && self.method.forbids_body() {
            return Err(RequestBuildError::BodyForbidden {
                method: self.method,
            });
        }
        if self.timeout.is_zero() {
            return Err(RequestBuildError::NonPositiveTimeout);
        }
        if self.connect_timeout.is_zero() {
            return Err(RequestBuildError::NonPositiveConnectTimeout);
        }

        Ok(Request {
            id: Uuid::new_v4(),
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            max_redirects: self.max_redirects,
            raise_error_responses: self.raise_error_responses,
            callback_class_name: self.callback_class_name.unwrap_or_default(),
            callback_args: self.callback_args,
        })
    }
}
