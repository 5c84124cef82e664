//! [`RequestOptions`]: the per-call knobs `request`/`get`/`post`/... accept
//! on top of method and URL (§3 Request value model).

use async_http_value::{CallbackArgs, HttpHeaders, JsonScalar};
use std::time::Duration;

/// Builder-style options threaded into a built [`async_http_value::Request`].
///
/// Defaults match [`async_http_value::RequestBuilder`]'s: no body, a 60s
/// timeout, a 10s connect timeout, 10 max redirects, and
/// `raise_error_responses = false`.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub(crate) headers: HttpHeaders,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) connect_timeout: Option<Duration>,
    pub(crate) max_redirects: Option<u32>,
    pub(crate) raise_error_responses: bool,
    pub(crate) callback: Option<String>,
    pub(crate) callback_args: CallbackArgs,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
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

    /// Appends a query-string pair; pairs are applied to the URL in the
    /// order given, alongside whatever query the URL already carries.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = Some(max);
        self
    }

    pub fn raise_error_responses(mut self, raise: bool) -> Self {
        self.raise_error_responses = raise;
        self
    }

    /// Names the registered [`async_http_jobqueue::CallbackHandler`] this
    /// request's terminal value should be routed to. Required: `request()`
    /// rejects options with no callback set.
    pub fn callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }

    pub fn callback_arg(mut self, key: impl Into<String>, value: impl Into<JsonScalar>) -> Self {
        self.callback_args.insert(key, value);
        self
    }

    pub fn callback_args(mut self, args: CallbackArgs) -> Self {
        self.callback_args = args;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_no_callback() {
        assert!(RequestOptions::new().callback.is_none());
    }

    #[test]
    fn builder_methods_accumulate() {
        let opts = RequestOptions::new()
            .header("Accept", "application/json")
            .query("page", "2")
            .callback("WebhookCallback")
            .callback_arg("webhook_id", "W");
        assert_eq!(opts.headers.get("accept"), Some("application/json"));
        assert_eq!(opts.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(opts.callback.as_deref(), Some("WebhookCallback"));
        assert!(opts.callback_args.contains_key("webhook_id"));
    }
}
