//! Immutable `Response` value.

use crate::callback_args::CallbackArgs;
use crate::headers::HttpHeaders;
use crate::request::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Error returned when constructing a [`Response`] with an out-of-range
/// status code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("status {0} is outside the valid 100..=599 range")]
pub struct InvalidStatus(pub u16);

/// An immutable terminal HTTP response delivered to `on_complete`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    status: u16,
    pub headers: HttpHeaders,
    pub body: Option<Vec<u8>>,
    pub protocol: String,
    pub duration: Duration,
    pub request_id: Uuid,
    #[serde(with = "crate::serde_url::single")]
    pub url: Url,
    pub method: Method,
    pub callback_args: CallbackArgs,
    #[serde(with = "crate::serde_url::vec")]
    pub redirects: Vec<Url>,
}

impl Response {
    /// Builds a new `Response`, validating that `status` is in `100..=599`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        status: u16,
        headers: HttpHeaders,
        body: Option<Vec<u8>>,
        protocol: impl Into<String>,
        duration: Duration,
        request_id: Uuid,
        url: Url,
        method: Method,
        callback_args: CallbackArgs,
        redirects: Vec<Url>,
    ) -> Result<Self, InvalidStatus> {
        if !(100..=599).contains(&status) {
            return Err(InvalidStatus(status));
        }
        Ok(Self {
            status,
            headers,
            body,
            protocol: protocol.into(),
            duration,
            request_id,
            url,
            method,
            callback_args,
            redirects,
        })
    }

    /// The HTTP status code, guaranteed to be in `100..=599`.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for `200..=299`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for `400..=499`.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// True for `500..=599`.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: u16) -> Result<Response, InvalidStatus> {
        Response::new(
            status,
            HttpHeaders::new(),
            None,
            "HTTP/1.1",
            Duration::from_millis(10),
            Uuid::new_v4(),
            Url::parse("https://example.com").unwrap(),
            Method::Get,
            CallbackArgs::new(),
            vec![],
        )
    }

    #[test]
    fn classifies_success_client_and_server_errors() {
        assert!(sample(200).unwrap().is_success());
        assert!(sample(299).unwrap().is_success());
        assert!(sample(404).unwrap().is_client_error());
        assert!(sample(500).unwrap().is_server_error());
        assert!(sample(599).unwrap().is_server_error());
    }

    #[test]
    fn rejects_status_outside_valid_range() {
        assert!(sample(99).is_err());
        assert!(sample(600).is_err());
    }

    #[test]
    fn accepts_boundary_statuses() {
        assert!(sample(100).is_ok());
        assert!(sample(599).is_ok());
    }
}
