//! [`FacadeError`]: the error type every public free function in this
//! crate returns, unifying configuration, request-building, and processor
//! failures behind one boundary.

use crate::config::ConfigurationError;
use async_http_jobqueue::CallbackJobError;
use async_http_processor::ProcessorError;
use async_http_value::RequestBuildError;

#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("async-http has not been configured; call configure() first")]
    NotConfigured,

    #[error("async-http is already configured; call reset_for_test() between tests")]
    AlreadyConfigured,

    #[error("request options specify no callback class; set RequestOptions::callback(...)")]
    MissingCallback,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    RequestBuild(#[from] RequestBuildError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Callback(#[from] CallbackJobError),

    #[error("failed to (de)serialize a job payload: {0}")]
    Serialization(#[from] serde_json::Error),
}
