//! Callback dispatch (§4.5): turn one finished execution into a
//! `CallbackJob`, externalizing the body through the default payload store
//! when the serialized terminal value is too large to carry as a plain job
//! argument.

use crate::metrics::Metrics;
use async_http_client::ExecutionFailure;
use async_http_jobqueue::{CallbackJob, JobEnvelope, JobQueue, JobQueueError};
use async_http_payload::{PayloadStoreRegistry, PayloadStoreRegistryError};
use async_http_value::{Error as TransportError, ErrorType, HttpError, Request, Response, ResultKind, TerminalValue};
use std::time::Duration;

/// Errors raised while dispatching a finished request's terminal value.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to push callback job: {0}")]
    JobQueue(#[from] JobQueueError),
    #[error("payload store error: {0}")]
    PayloadStore(#[from] async_http_payload::PayloadStoreError),
    #[error("payload store registry error: {0}")]
    PayloadStoreRegistry(#[from] PayloadStoreRegistryError),
    #[error("failed to serialize terminal value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classifies a completed execution into the terminal value that gets
/// serialized and dispatched: a successful/erroring `Response`, an
/// `HttpError` (only when `raise_error_responses` was set), or a transport
/// `TransportError`/`RedirectError`.
pub fn build_terminal_value(
    request: &Request,
    result: Result<Response, ExecutionFailure>,
) -> TerminalValue {
    match result {
        Ok(response) => {
            if request.raise_error_responses && (response.is_client_error() || response.is_server_error()) {
                TerminalValue::HttpError(HttpError::from_response(response))
            } else {
                TerminalValue::Response(response)
            }
        }
        Err(ExecutionFailure::Transport(error)) => TerminalValue::TransportError(error),
        Err(ExecutionFailure::Redirect(error)) => TerminalValue::RedirectError(error),
    }
}

/// The execution duration recorded for metrics, `Duration::ZERO` for the
/// redirect-violation case (which carries no duration field of its own).
pub fn terminal_value_duration(value: &TerminalValue) -> Duration {
    match value {
        TerminalValue::Response(r) => r.duration,
        TerminalValue::TransportError(e) => e.duration,
        TerminalValue::HttpError(e) => e.response().duration,
        TerminalValue::RedirectError(_) => Duration::ZERO,
    }
}

/// The `ErrorType` bucket this value should count against, if any.
pub fn terminal_value_error_type(value: &TerminalValue) -> Option<ErrorType> {
    match value {
        TerminalValue::Response(_) | TerminalValue::HttpError(_) => None,
        TerminalValue::TransportError(e) => Some(e.error_type),
        TerminalValue::RedirectError(_) => Some(ErrorType::Redirect),
    }
}

/// Serializes `value`, externalizing its `body` field through the default
/// payload store when the serialized size exceeds `threshold` bytes, then
/// pushes a `CallbackJob` onto `job_queue`.
pub async fn dispatch(
    value: TerminalValue,
    callback_class_name: &str,
    job_queue: &dyn JobQueue,
    payload_stores: &PayloadStoreRegistry,
    payload_store_threshold: usize,
    metrics: &Metrics,
) -> Result<(), DispatchError> {
    if let Some(error_type) = terminal_value_error_type(&value) {
        metrics.record_error(error_type);
    }
    metrics.record_completed(terminal_value_duration(&value).as_millis() as u64);

    let result_kind = value.result_kind();
    let mut hash = value.as_hash();

    let serialized_size = serde_json::to_vec(&hash)?.len();
    if serialized_size > payload_store_threshold {
        if let Ok(store) = payload_stores.default_store() {
            let key = store.generate_key();
            if let Some(extracted) = async_http_value::externalize_body(&mut hash, store.name(), &key) {
                store.store(&key, extracted).await?;
            }
        }
    }

    let callback_job = CallbackJob::new(hash, result_kind, callback_class_name);
    let envelope = JobEnvelope::new("CallbackJob", vec![serde_json::to_value(&callback_job)?]);
    job_queue.push(envelope).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_http_jobqueue::MemoryJobQueue;
    use async_http_payload::MemoryPayloadStore;
    use async_http_value::{CallbackArgs, HttpHeaders, Method};
    use std::sync::Arc;
    use uuid::Uuid;
    use url::Url;

    fn small_response() -> Response {
        Response::new(
            200,
            HttpHeaders::new(),
            Some(b"ok".to_vec()),
            "HTTP/1.1",
            Duration::from_millis(5),
            Uuid::new_v4(),
            Url::parse("https://example.com/test/200").unwrap(),
            Method::Get,
            CallbackArgs::new(),
            vec![],
        )
        .unwrap()
    }

    fn large_response() -> Response {
        Response::new(
            200,
            HttpHeaders::new(),
            Some(vec![b'a'; 4096]),
            "HTTP/1.1",
            Duration::from_millis(5),
            Uuid::new_v4(),
            Url::parse("https://example.com/large").unwrap(),
            Method::Get,
            CallbackArgs::new(),
            vec![],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn small_responses_are_dispatched_inline() {
        let queue = MemoryJobQueue::new();
        let mut stores = PayloadStoreRegistry::new();
        stores.register(Arc::new(MemoryPayloadStore::new("default")), true).unwrap();
        let metrics = Metrics::new();

        dispatch(
            TerminalValue::Response(small_response()),
            "MyCallback",
            &queue,
            &stores,
            16 * 1024,
            &metrics,
        )
        .await
        .unwrap();

        let pushed = queue.drain();
        assert_eq!(pushed.len(), 1);
        let callback_job: CallbackJob = serde_json::from_value(pushed[0].args[0].clone()).unwrap();
        assert!(async_http_value::body_ref(&callback_job.result_blob).is_none());
    }

    #[tokio::test]
    async fn oversized_bodies_are_externalized_to_the_default_store() {
        let queue = MemoryJobQueue::new();
        let mut stores = PayloadStoreRegistry::new();
        let store = Arc::new(MemoryPayloadStore::new("default"));
        stores.register(store.clone(), true).unwrap();
        let metrics = Metrics::new();

        dispatch(
            TerminalValue::Response(large_response()),
            "MyCallback",
            &queue,
            &stores,
            1024,
            &metrics,
        )
        .await
        .unwrap();

        let pushed = queue.drain();
        let callback_job: CallbackJob = serde_json::from_value(pushed[0].args[0].clone()).unwrap();
        let reference = async_http_value::body_ref(&callback_job.result_blob).unwrap();
        assert_eq!(reference.store, "default");
        assert!(store.len() == 1);
    }

    #[test]
    fn transport_errors_classify_into_their_own_error_type() {
        let error = TransportError::new(
            "TimeoutError",
            "timed out",
            None,
            ErrorType::Timeout,
            Duration::from_millis(1),
            Uuid::new_v4(),
            "https://example.com",
            Method::Get,
            CallbackArgs::new(),
        );
        let value = TerminalValue::TransportError(error);
        assert_eq!(terminal_value_error_type(&value), Some(ErrorType::Timeout));
    }
}
