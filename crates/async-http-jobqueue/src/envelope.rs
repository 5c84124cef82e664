//! [`JobEnvelope`]: the opaque unit of work pushed onto the host job queue.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A job to be run by the host job-worker pool: a class name to dispatch
/// to, its arguments, and whatever bookkeeping the host queue wants to
/// attach (used verbatim as the inflight registry's `job_envelope` blob so
/// it can be re-pushed unchanged on orphan recovery).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub class: String,
    pub args: Vec<serde_json::Value>,
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl JobEnvelope {
    pub fn new(class: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            class: class.into(),
            args,
            retry_count: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
