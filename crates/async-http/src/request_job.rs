//! `execute_request_job`: the fallback enqueue path (§6.2) for code that
//! isn't already inside a `request`/`get`/`post`/... call — a worker pops a
//! `RequestJob` off the host queue and hands it here to resume.

use crate::error::FacadeError;
use async_http_jobqueue::{JobEnvelope, RequestJob};
use async_http_processor::Processor;
use async_http_value::Request;

/// Rebuilds the `Request` from `job.request_blob`, overrides
/// `callback_class_name`/`raise_error_responses` from the job's own fields
/// (the job envelope is authoritative over whatever was serialized into the
/// blob, since a host may re-route a retried job to a different callback),
/// and hands it to the processor exactly as `request()` would have.
pub async fn execute_request_job(job: RequestJob, processor: &Processor) -> Result<(), FacadeError> {
    let mut request: Request = serde_json::from_value(job.request_blob.clone())?;
    request.callback_class_name = job.callback_class_name.clone();
    request.raise_error_responses = job.raise_error_responses;

    let envelope = JobEnvelope::new("RequestJob", vec![serde_json::to_value(&job)?]);
    processor.enqueue(request, envelope).await?;
    Ok(())
}
