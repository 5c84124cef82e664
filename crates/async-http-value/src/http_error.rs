//! `HttpError` and redirect-policy error hierarchy.

use crate::request::Method;
use crate::response::Response;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// An error produced only when `raise_error_responses` was set (or a
/// redirect policy was violated): wraps the terminal [`Response`] for a
/// non-2xx status.
#[derive(Clone, Debug, PartialEq)]
pub enum HttpError {
    /// 4xx status.
    ClientError(Response),
    /// 5xx status.
    ServerError(Response),
}

impl HttpError {
    /// Classifies `response` into `ClientError`/`ServerError` based on its
    /// status code.
    ///
    /// # Panics
    ///
    /// Panics if `response.status()` is not >= 400; callers must only
    /// invoke this after confirming the response is an error response.
    pub fn from_response(response: Response) -> Self {
        if response.is_client_error() {
            HttpError::ClientError(response)
        } else if response.is_server_error() {
            HttpError::ServerError(response)
        } else {
            panic!(
                "HttpError::from_response called with non-error status {}",
                response.status()
            );
        }
    }

    pub fn response(&self) -> &Response {
        match self {
            HttpError::ClientError(r) | HttpError::ServerError(r) => r,
        }
    }

    pub fn status(&self) -> u16 {
        self.response().status()
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ClientError(r) => write!(f, "client error: status {}", r.status()),
            HttpError::ServerError(r) => write!(f, "server error: status {}", r.status()),
        }
    }
}

impl std::error::Error for HttpError {}

/// Wire form of [`HttpError`]; `error_class` records which variant this
/// was so `load` can dispatch without re-deriving it from the status
/// (mirrors the embedded-class dispatch the data model calls for).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpErrorHash {
    pub error_class: String,
    pub response: Response,
}

impl From<&HttpError> for HttpErrorHash {
    fn from(value: &HttpError) -> Self {
        match value {
            HttpError::ClientError(r) => HttpErrorHash {
                error_class: "ClientError".to_string(),
                response: r.clone(),
            },
            HttpError::ServerError(r) => HttpErrorHash {
                error_class: "ServerError".to_string(),
                response: r.clone(),
            },
        }
    }
}

/// Error returned when loading a serialized `HttpError`/`RedirectError`
/// whose `error_class` tag is not recognized.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized error_class {0:?}")]
pub struct UnknownErrorClass(pub String);

impl HttpErrorHash {
    /// Reconstructs an [`HttpError`], dispatching on the embedded status
    /// (`ClientError` for 4xx, `ServerError` for 5xx) as a defense against a
    /// stale/forged `error_class` tag; if the tag and the status disagree,
    /// the status wins.
    pub fn load(self) -> HttpError {
        HttpError::from_response(self.response)
    }
}

/// Error produced when a redirect policy is violated.
#[derive(Clone, Debug, PartialEq)]
pub enum RedirectError {
    /// More redirects were followed than `max_redirects` allows.
    TooManyRedirects(RedirectErrorData),
    /// A URL already visited during this request was redirected to again.
    RecursiveRedirect(RedirectErrorData),
}

/// Shared fields carried by both redirect error variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RedirectErrorData {
    pub redirects: Vec<Url>,
    pub request_id: Uuid,
    pub url: Url,
    pub method: Method,
}

impl RedirectError {
    pub fn data(&self) -> &RedirectErrorData {
        match self {
            RedirectError::TooManyRedirects(d) | RedirectError::RecursiveRedirect(d) => d,
        }
    }
}

impl std::fmt::Display for RedirectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedirectError::TooManyRedirects(d) => {
                write!(f, "too many redirects ({} hops)", d.redirects.len())
            }
            RedirectError::RecursiveRedirect(d) => {
                write!(f, "recursive redirect detected after {} hops", d.redirects.len())
            }
        }
    }
}

impl std::error::Error for RedirectError {}

/// Wire form of [`RedirectError`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedirectErrorHash {
    pub error_class: String,
    #[serde(flatten)]
    pub data: RedirectErrorData,
}

impl From<&RedirectError> for RedirectErrorHash {
    fn from(value: &RedirectError) -> Self {
        match value {
            RedirectError::TooManyRedirects(d) => RedirectErrorHash {
                error_class: "TooManyRedirectsError".to_string(),
                data: d.clone(),
            },
            RedirectError::RecursiveRedirect(d) => RedirectErrorHash {
                error_class: "RecursiveRedirectError".to_string(),
                data: d.clone(),
            },
        }
    }
}

impl RedirectErrorHash {
    /// Reconstructs a [`RedirectError`], dispatching on `error_class`.
    pub fn load(self) -> Result<RedirectError, UnknownErrorClass> {
        match self.error_class.as_str() {
            "TooManyRedirectsError" => Ok(RedirectError::TooManyRedirects(self.data)),
            "RecursiveRedirectError" => Ok(RedirectError::RecursiveRedirect(self.data)),
            other => Err(UnknownErrorClass(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback_args::CallbackArgs;
    use crate::headers::HttpHeaders;
    use std::time::Duration;

    fn response(status: u16) -> Response {
        Response::new(
            status,
            HttpHeaders::new(),
            None,
            "HTTP/1.1",
            Duration::from_millis(1),
            Uuid::new_v4(),
            Url::parse("https://example.com").unwrap(),
            Method::Get,
            CallbackArgs::new(),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn classifies_4xx_and_5xx() {
        assert!(matches!(
            HttpError::from_response(response(404)),
            HttpError::ClientError(_)
        ));
        assert!(matches!(
            HttpError::from_response(response(503)),
            HttpError::ServerError(_)
        ));
    }

    #[test]
    fn hash_round_trip_dispatches_on_status() {
        let original = HttpError::from_response(response(404));
        let hash = HttpErrorHash::from(&original);
        let loaded = hash.load();
        assert_eq!(loaded, original);
    }

    #[test]
    fn redirect_error_hash_dispatches_on_error_class() {
        let data = RedirectErrorData {
            redirects: vec![
                Url::parse("https://a.example").unwrap(),
                Url::parse("https://b.example").unwrap(),
            ],
            request_id: Uuid::new_v4(),
            url: Url::parse("https://a.example").unwrap(),
            method: Method::Get,
        };
        let original = RedirectError::TooManyRedirects(data);
        let hash = RedirectErrorHash::from(&original);
        let loaded = hash.load().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn redirect_error_preserves_ordering() {
        let urls: Vec<Url> = (0..3)
            .map(|i| Url::parse(&format!("https://example.com/{i}")).unwrap())
            .collect();
        let data = RedirectErrorData {
            redirects: urls.clone(),
            request_id: Uuid::new_v4(),
            url: urls[0].clone(),
            method: Method::Get,
        };
        let err = RedirectError::RecursiveRedirect(data);
        assert_eq!(err.data().redirects, urls);
    }
}
