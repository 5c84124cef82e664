//! Public facade: `configure`/`request`/`get`/`post`/.../`start!`/`quiet!`/
//! `shutdown`, plus the job-system integration shims (`ContextMiddleware`,
//! `install_lifecycle_hooks`) a host application wires its worker pool
//! through.
//!
//! Everything here is a thin coordinating layer over the seven collaborator
//! crates: a single process-wide [`Configuration`] assembles a
//! [`Processor`](async_http_processor::Processor), and the free functions in
//! this module are the only way application code should ever touch it.

pub mod callback;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod options;
pub mod request_job;

pub use async_http_jobqueue::{CallbackError, CallbackHandler, CallbackJob};
pub use async_http_value::{HttpHeaders, Method, Response};
pub use callback::{CallbackHandlerRegistry, Hooks};
pub use config::{Configuration, ConfigurationBuilder, ConfigurationError};
pub use context::JobContext;
pub use error::FacadeError;
pub use middleware::{install_lifecycle_hooks, ContextMiddleware};
pub use options::RequestOptions;

use async_http_jobqueue::{JobEnvelope, JobQueue, RequestJob};
use async_http_processor::{MetricsSnapshot, Processor};
use async_http_registry::InflightRegistry;
use async_http_value::Request;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;
use uuid::Uuid;

struct Runtime {
    processor: Arc<Processor>,
    job_queue: Arc<dyn JobQueue>,
    payload_stores: Arc<async_http_payload::PayloadStoreRegistry>,
    callback_handlers: Arc<CallbackHandlerRegistry>,
    hooks: Arc<Hooks>,
}

impl Clone for Runtime {
    fn clone(&self) -> Self {
        Self {
            processor: self.processor.clone(),
            job_queue: self.job_queue.clone(),
            payload_stores: self.payload_stores.clone(),
            callback_handlers: self.callback_handlers.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

static RUNTIME: OnceLock<RwLock<Option<Runtime>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Runtime>> {
    RUNTIME.get_or_init(|| RwLock::new(None))
}

/// Clones the cheap `Arc` handles out from under a brief read lock so no
/// caller ever holds a sync lock across an `.await`.
fn runtime() -> Result<Runtime, FacadeError> {
    slot()
        .read()
        .expect("async-http runtime lock poisoned")
        .clone()
        .ok_or(FacadeError::NotConfigured)
}

/// Assembles the process-wide runtime from a [`ConfigurationBuilder`] (§2):
/// builds the inflight registry, the processor, registers
/// [`ContextMiddleware`] on the job queue, and wires lifecycle signals to
/// `start!`/`quiet!`/`shutdown` via [`install_lifecycle_hooks`].
///
/// Fails with [`FacadeError::AlreadyConfigured`] if called twice without an
/// intervening [`reset_for_test`].
pub fn configure(
    f: impl FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
) -> Result<(), FacadeError> {
    configure_with_shutdown_timeout(f, Duration::from_secs(30))
}

/// Like [`configure`], but lets the host override the timeout
/// [`install_lifecycle_hooks`] passes to `Processor::stop` on a `Shutdown`
/// signal.
pub fn configure_with_shutdown_timeout(
    f: impl FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    shutdown_timeout: Duration,
) -> Result<(), FacadeError> {
    let mut guard = slot().write().expect("async-http runtime lock poisoned");
    if guard.is_some() {
        return Err(FacadeError::AlreadyConfigured);
    }

    let configuration = f(Configuration::builder()).build()?;

    let registry = InflightRegistry::new(
        configuration.inflight_backend,
        configuration.processor_config.registry_config().clone(),
        configuration.owner_process_id,
    );

    let processor = Arc::new(Processor::new(
        configuration.processor_config,
        registry,
        configuration.job_queue.clone(),
        configuration.payload_stores.clone(),
    ));

    configuration
        .job_queue
        .register_middleware(Arc::new(ContextMiddleware::new()));
    install_lifecycle_hooks(configuration.job_queue.as_ref(), processor.clone(), shutdown_timeout);

    *guard = Some(Runtime {
        processor,
        job_queue: configuration.job_queue,
        payload_stores: Arc::new(configuration.payload_stores),
        callback_handlers: Arc::new(configuration.callback_handlers),
        hooks: Arc::new(configuration.hooks),
    });
    Ok(())
}

/// `stopped -> starting -> running`. Mirrors the host job system's startup
/// hook calling through `install_lifecycle_hooks`; exposed directly for
/// hosts that drive the lifecycle without a `JobQueue::on_lifecycle`
/// subscription.
pub fn start() -> Result<(), FacadeError> {
    Ok(runtime()?.processor.start()?)
}

/// `running -> draining`.
pub fn quiet() -> Result<(), FacadeError> {
    Ok(runtime()?.processor.quiet()?)
}

/// Waits up to `timeout` for in-flight requests to finish, re-enqueues
/// whatever remains, and tears down the reactor thread.
pub async fn shutdown(timeout: Duration) -> Result<(), FacadeError> {
    runtime()?.processor.stop(timeout).await?;
    Ok(())
}

/// A point-in-time snapshot of the processor's counters.
pub fn metrics_snapshot() -> Result<MetricsSnapshot, FacadeError> {
    Ok(runtime()?.processor.metrics())
}

/// Builds a `Request` from `method`/`url`/`options`, wraps it in a
/// `RequestJob`-shaped envelope so an orphan-recovery re-enqueue has
/// something to push back onto the job queue, and hands both to the
/// processor.
///
/// Rejects options with no [`RequestOptions::callback`] set — every
/// request must name where its terminal value goes (§3).
pub async fn request(method: Method, url: impl AsRef<str>, options: RequestOptions) -> Result<(), FacadeError> {
    let callback_class_name = options.callback.clone().ok_or(FacadeError::MissingCallback)?;

    let mut url = url.as_ref().to_string();
    if !options.query.is_empty() {
        let mut parsed = url::Url::parse(&url).map_err(|e| FacadeError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = parsed.query_pairs_mut();
            for (key, value) in &options.query {
                pairs.append_pair(key, value);
            }
        }
        url = parsed.to_string();
    }

    let mut builder = Request::builder(method, url)
        .headers(options.headers)
        .callback_class_name(&callback_class_name)
        .callback_args(options.callback_args)
        .raise_error_responses(options.raise_error_responses);
    if let Some(body) = options.body {
        builder = builder.body(body);
    }
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = options.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(max_redirects) = options.max_redirects {
        builder = builder.max_redirects(max_redirects);
    }
    let built = builder.build()?;

    enqueue(built).await
}

async fn enqueue(built: Request) -> Result<(), FacadeError> {
    let request_id = built.id;
    let job = RequestJob::new(
        serde_json::to_value(&built)?,
        built.callback_class_name.clone(),
        built.raise_error_responses,
        request_id,
    );
    let envelope = JobEnvelope::new("RequestJob", vec![serde_json::to_value(&job)?]);

    runtime()?.processor.enqueue(built, envelope).await?;
    Ok(())
}

macro_rules! method_fn {
    ($name:ident, $method:expr) => {
        pub async fn $name(url: impl AsRef<str>, options: RequestOptions) -> Result<(), FacadeError> {
            request($method, url, options).await
        }
    };
}

method_fn!(get, Method::Get);
method_fn!(post, Method::Post);
method_fn!(put, Method::Put);
method_fn!(patch, Method::Patch);
method_fn!(delete, Method::Delete);
method_fn!(head, Method::Head);
method_fn!(options_request, Method::Options);

/// Runs a popped `CallbackJob` to completion: resolves the registered
/// handler, reconstructs the terminal value (fetching an externalized body
/// first if needed), and invokes `on_complete`/`on_error`.
pub async fn run_callback_job(job: CallbackJob) -> Result<(), FacadeError> {
    let runtime = runtime()?;
    callback::execute_callback_job(
        job,
        runtime.callback_handlers.as_ref(),
        runtime.payload_stores.as_ref(),
        runtime.hooks.as_ref(),
    )
    .await?;
    Ok(())
}

/// Runs a popped `RequestJob` to completion (§6.2 fallback enqueue path):
/// rebuilds the request and hands it to the processor exactly as
/// [`request`] would have.
pub async fn run_request_job(job: RequestJob) -> Result<(), FacadeError> {
    request_job::execute_request_job(job, &runtime()?.processor).await
}

/// Tears down and forgets the process-wide runtime without waiting for
/// in-flight work, so a test suite can call [`configure`] again. Never call
/// this in production: it does not honor the at-least-once completion
/// guarantee `shutdown` provides.
pub fn reset_for_test() {
    if let Some(runtime) = slot().write().expect("async-http runtime lock poisoned").take() {
        runtime.processor.reset();
    }
}

#[doc(hidden)]
pub fn current_request_id_for_test() -> Uuid {
    Uuid::new_v4()
}
