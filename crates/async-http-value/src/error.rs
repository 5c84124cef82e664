//! The transport `Error` value delivered to `on_error` when the HTTP
//! exchange itself never produced a response (as opposed to [`crate::http_error::HttpError`],
//! which wraps a non-2xx response).

use crate::callback_args::CallbackArgs;
use crate::request::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Classification of a transport failure, in the tie-break order the
/// executor applies when more than one category could describe a given
/// underlying failure (first match wins).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Timeout,
    Connection,
    Ssl,
    ResponseTooLarge,
    Redirect,
    Protocol,
    Unknown,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::Timeout => "timeout",
            ErrorType::Connection => "connection",
            ErrorType::Ssl => "ssl",
            ErrorType::ResponseTooLarge => "response_too_large",
            ErrorType::Redirect => "redirect",
            ErrorType::Protocol => "protocol",
            ErrorType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable transport-level failure produced by classifying a caught
/// executor exception (see `async-http-client`'s classifier).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Error {
    pub class_name: String,
    pub message: String,
    pub backtrace: Option<String>,
    pub error_type: ErrorType,
    pub duration: Duration,
    pub request_id: Uuid,
    pub url: String,
    pub method: Method,
    pub callback_args: CallbackArgs,
}

impl Error {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        class_name: impl Into<String>,
        message: impl Into<String>,
        backtrace: Option<String>,
        error_type: ErrorType,
        duration: Duration,
        request_id: Uuid,
        url: impl Into<String>,
        method: Method,
        callback_args: CallbackArgs,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            backtrace,
            error_type,
            duration,
            request_id,
            url: url.into(),
            method,
            callback_args,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.class_name, self.error_type, self.message)
    }
}

impl std::error::Error for Error {}
