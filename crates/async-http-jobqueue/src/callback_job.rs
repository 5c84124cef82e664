//! `CallbackJob`: the job class that runs a user's `on_complete`/`on_error`
//! callback once a request finishes (§4.5, §6.2).

use async_http_value::ResultKind;
use serde::{Deserialize, Serialize};

/// Error raised resolving or running a callback. `ClassNotRegistered`
/// mirrors the "resolve callback_class_name to a class" step failing: the
/// host application registers callback classes by name at configure-time,
/// and an unknown name can't be dispatched.
#[derive(Debug, thiserror::Error)]
pub enum CallbackJobError {
    #[error("no callback class registered under the name {0:?}")]
    ClassNotRegistered(String),
    #[error("failed to load result blob: {0}")]
    LoadFailed(String),
    #[error("callback handler panicked or returned an error: {0}")]
    HandlerFailed(String),
}

/// The arguments a `CallbackJob` carries, exactly as enqueued by the
/// Processor's completion path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallbackJob {
    /// The terminal value's neutral-hash form, possibly still containing a
    /// `$ref` marker in place of an externalized body.
    pub result_blob: serde_json::Value,
    pub result_kind: ResultKindTag,
    pub callback_class_name: String,
}

/// Wire form of [`ResultKind`]: serializes as the lowercase strings §4.5
/// specifies (`"response"`/`"error"`), independent of `ResultKind`'s own
/// `Display`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKindTag {
    Response,
    Error,
}

impl From<ResultKind> for ResultKindTag {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Response => ResultKindTag::Response,
            ResultKind::Error => ResultKindTag::Error,
        }
    }
}

impl From<ResultKindTag> for ResultKind {
    fn from(tag: ResultKindTag) -> Self {
        match tag {
            ResultKindTag::Response => ResultKind::Response,
            ResultKindTag::Error => ResultKind::Error,
        }
    }
}

impl CallbackJob {
    pub fn new(
        result_blob: serde_json::Value,
        result_kind: ResultKind,
        callback_class_name: impl Into<String>,
    ) -> Self {
        Self {
            result_blob,
            result_kind: result_kind.into(),
            callback_class_name: callback_class_name.into(),
        }
    }
}

/// A user-registered callback target: `on_complete`/`on_error`, invoked by
/// `CallbackJob` execution after the terminal value has been reconstructed.
/// Implemented by the host application, resolved by `callback_class_name`.
pub trait CallbackHandler: Send + Sync {
    fn on_complete(&self, response: async_http_value::Response);
    fn on_error(&self, error: CallbackError);
}

/// The reconstructed failure delivered to [`CallbackHandler::on_error`]:
/// either a transport failure or an HTTP-status failure, depending on
/// which terminal-value kind `load()` dispatched to.
#[derive(Debug)]
pub enum CallbackError {
    Transport(async_http_value::Error),
    Http(async_http_value::HttpError),
    Redirect(async_http_value::RedirectError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_kind_tag_round_trips() {
        assert_eq!(ResultKindTag::from(ResultKind::Response), ResultKindTag::Response);
        assert_eq!(ResultKind::from(ResultKindTag::Error), ResultKind::Error);
    }

    #[test]
    fn callback_job_serializes_with_snake_case_kind() {
        let job = CallbackJob::new(serde_json::json!({}), ResultKind::Error, "MyCallback");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["result_kind"], serde_json::json!("error"));
    }
}
