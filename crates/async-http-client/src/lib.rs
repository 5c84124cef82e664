//! The HTTP executor: issues wire-level requests under a cooperative I/O
//! reactor, pooling connections per origin and classifying every failure
//! into exactly one [`async_http_value::ErrorType`].
//!
//! Named distinctly from the generic task-spawning `Executor` concept used
//! elsewhere (`async-http-processor`'s reactor loop) since this crate is
//! specifically about executing HTTP wire requests.

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod redirect;

pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use error::{ExecutionFailure, ExecutorError};
pub use executor::HttpExecutor;
