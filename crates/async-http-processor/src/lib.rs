//! The reactor that owns every outbound HTTP exchange: a dedicated
//! single-threaded runtime (§4.1) fed by job workers over a bounded
//! channel, with a background monitor (§4.3) keeping the shared in-flight
//! registry honest and dispatching finished requests back to the job queue
//! as callback jobs (§4.5).

mod backpressure;
mod config;
mod dispatch;
mod error;
mod inflight;
mod metrics;
mod monitor;
mod processor;
mod state;

pub use backpressure::BackpressureStrategy;
pub use config::{ProcessorConfig, ProcessorConfigBuilder, ProcessorConfigError};
pub use dispatch::{build_terminal_value, terminal_value_duration, terminal_value_error_type, DispatchError};
pub use error::ProcessorError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use processor::Processor;
pub use state::ProcessorState;
