//! Exception classification (§4.4): every failure the executor can produce
//! maps to exactly one [`ErrorType`], using the first matching category in
//! this priority order.

use async_http_value::ErrorType;
use std::error::Error as StdError;

/// Marker used internally to distinguish "we aborted the read ourselves
/// because the body exceeded `max_response_size`" from a genuine I/O error,
/// since `reqwest` doesn't have a variant for it.
#[derive(Debug)]
pub struct ResponseTooLarge;

impl std::fmt::Display for ResponseTooLarge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "response body exceeded the configured size limit")
    }
}

impl StdError for ResponseTooLarge {}

fn source_chain_contains(err: &(dyn StdError + 'static), needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Classifies a `reqwest::Error`, following the tie-break order from §4.4:
/// timeout, ssl, connection, response_too_large, redirect, protocol,
/// unknown. `ResponseTooLarge` is detected by inspecting the source chain
/// since our own abort surfaces as a decode/body error from `reqwest`.
pub fn classify_reqwest_error(err: &reqwest::Error) -> ErrorType {
    if err.is_timeout() {
        return ErrorType::Timeout;
    }
    if source_chain_contains(err, "ssl") || source_chain_contains(err, "tls") {
        return ErrorType::Ssl;
    }
    if err.is_connect() {
        return ErrorType::Connection;
    }
    if source_chain_contains(err, "connection refused")
        || source_chain_contains(err, "connection reset")
        || source_chain_contains(err, "broken pipe")
        || source_chain_contains(err, "unreachable")
    {
        return ErrorType::Connection;
    }
    if source_chain_contains(err, "response body exceeded") {
        return ErrorType::ResponseTooLarge;
    }
    if err.is_redirect() {
        return ErrorType::Redirect;
    }
    if err.is_body() || err.is_decode() || err.is_request() {
        return ErrorType::Protocol;
    }
    ErrorType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_too_large_marker_is_detected_in_source_chain() {
        let marker = ResponseTooLarge;
        assert!(source_chain_contains(&marker, "response body exceeded"));
    }
}
