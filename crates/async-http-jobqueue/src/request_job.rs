//! `RequestJob`: the fallback job class for enqueuing a request from code
//! that isn't already running inside a worker (§6.2).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Carries everything `Processor::enqueue` needs, serialized so it can
/// cross the job-queue boundary like any other job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestJob {
    /// The `Request`'s neutral-hash form (see `async_http_value::hash`).
    pub request_blob: serde_json::Value,
    pub callback_class_name: String,
    pub raise_error_responses: bool,
    #[serde(default)]
    pub extra: serde_json::Value,
    pub request_id: Uuid,
}

impl RequestJob {
    pub fn new(
        request_blob: serde_json::Value,
        callback_class_name: impl Into<String>,
        raise_error_responses: bool,
        request_id: Uuid,
    ) -> Self {
        Self {
            request_blob,
            callback_class_name: callback_class_name.into(),
            raise_error_responses,
            extra: serde_json::Value::Null,
            request_id,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }
}
